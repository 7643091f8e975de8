use std::collections::BTreeMap;

use itertools::{iproduct, Itertools};
use rand::Rng;

use crate::prelude::*;

fn nhwc_orders() -> Vec<Order> {
    vec![
        ORDER_NHWC.clone(),
        ORDER_HWNC.clone(),
        ORDER_HWCN.clone(),
        ORDER_NCHW.clone(),
        ORDER_CNHW.clone(),
        ORDER_CHWN.clone(),
    ]
}

fn all_permutations(order: &Order) -> Vec<Order> {
    order
        .axes()
        .iter()
        .cloned()
        .permutations(order.ndim())
        .map(|axes| Order::new(axes).unwrap())
        .collect()
}

fn dict(entries: &[(Axis, usize)]) -> BTreeMap<Axis, usize> {
    entries.iter().cloned().collect()
}

#[allow(clippy::too_many_arguments)]
fn deconvolution_scenario(
    ksize: impl Into<SpatialArg> + Copy,
    stride: i32,
    padding: i32,
    n: usize,
    h1: usize,
    w1: usize,
    c1: usize,
    c2: usize,
    expected: BTreeMap<Axis, usize>,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    for (order_x, order_w) in iproduct!(nhwc_orders(), nhwc_orders()) {
        let op = Deconvolution2D::new(ksize, stride, padding).unwrap();
        let (kh, kw) = op.ksize();
        let mut graph = Graph::new();
        let x = Variable::new(vec![n, h1, w1, c1], ORDER_NHWC.clone())
            .unwrap()
            .change_order(&order_x)
            .unwrap();
        let w = Variable::new(vec![c1, kh, kw, c2], ORDER_CHWN.clone())
            .unwrap()
            .change_order(&order_w)
            .unwrap();
        let x = graph.add_input(x);
        let w = graph.add_variable(w);

        let y = op.apply(&mut graph, x, w).unwrap();

        let y = graph.variable(y).unwrap();
        assert_eq!(y.order(), &order_x);
        assert_eq!(y.shape_dict(), expected);
        for axis in y.order().axes() {
            assert_eq!(y.size_of(*axis), Ok(expected[axis]));
        }
    }
}

#[test]
fn deconvolution_normal() {
    deconvolution_scenario(
        3,
        1,
        1,
        2,
        3,
        4,
        6,
        5,
        dict(&[(Axis::N, 2), (Axis::H, 3), (Axis::W, 4), (Axis::C, 5)]),
    );
}

#[test]
fn deconvolution_large_stride() {
    deconvolution_scenario(
        3,
        2,
        1,
        2,
        3,
        4,
        6,
        3,
        dict(&[(Axis::N, 2), (Axis::H, 5), (Axis::W, 7), (Axis::C, 3)]),
    );
}

#[test]
fn deconvolution_no_padding() {
    deconvolution_scenario(
        3,
        1,
        0,
        2,
        3,
        5,
        6,
        3,
        dict(&[(Axis::N, 2), (Axis::H, 5), (Axis::W, 7), (Axis::C, 3)]),
    );
}

#[test]
fn deconvolution_projection() {
    deconvolution_scenario(
        1,
        1,
        0,
        2,
        5,
        7,
        6,
        3,
        dict(&[(Axis::N, 2), (Axis::H, 5), (Axis::W, 7), (Axis::C, 3)]),
    );
}

#[test]
fn deconvolution_fully_connected() {
    deconvolution_scenario(
        (5, 7),
        1,
        0,
        2,
        1,
        1,
        6,
        3,
        dict(&[(Axis::N, 2), (Axis::H, 5), (Axis::W, 7), (Axis::C, 3)]),
    );
}

#[test]
fn convolution_is_closed_over_permutations() {
    for (order_x, order_w) in iproduct!(nhwc_orders(), nhwc_orders()) {
        let mut graph = Graph::new();
        let x = Variable::new(vec![2, 7, 9, 4], ORDER_NHWC.clone())
            .unwrap()
            .change_order(&order_x)
            .unwrap();
        let w = Variable::new(vec![4, 3, 3, 8], ORDER_CHWN.clone())
            .unwrap()
            .change_order(&order_w)
            .unwrap();
        let x = graph.add_input(x);
        let w = graph.add_variable(w);
        let y = Convolution2D::new(3, 2, 1)
            .unwrap()
            .apply(&mut graph, x, w)
            .unwrap();
        let y = graph.variable(y).unwrap();
        assert_eq!(y.order(), &order_x);
        assert_eq!(
            y.shape_dict(),
            dict(&[(Axis::N, 2), (Axis::H, 4), (Axis::W, 5), (Axis::C, 8)])
        );
    }
}

#[test]
fn pooling_matches_hand_computed_extents_for_random_inputs() {
    let mut rng = rand::thread_rng();
    for _ in 0..50 {
        let (kh, kw) = (rng.gen_range(1..=4), rng.gen_range(1..=4));
        let (sh, sw) = (rng.gen_range(1..=3), rng.gen_range(1..=3));
        let (ph, pw) = (rng.gen_range(0..=2), rng.gen_range(0..=2));
        let h: usize = rng.gen_range(kh..=kh + 10);
        let w: usize = rng.gen_range(kw..=kw + 10);
        let expected_h = (h + 2 * ph + sh - kh - 1) / sh + 1;
        let expected_w = (w + 2 * pw + sw - kw - 1) / sw + 1;
        let edge_ignored = (h + 2 * ph - kh) % sh != 0 || (w + 2 * pw - kw) % sw != 0;

        for order in nhwc_orders() {
            let mut graph = Graph::new();
            let x = Variable::new(vec![3, h, w, 5], ORDER_NHWC.clone())
                .unwrap()
                .change_order(&order)
                .unwrap();
            let x = graph.add_input(x);
            let op = Pooling2D::max((kh, kw), (sh, sw), (ph, pw)).unwrap();
            let y = op.apply(&mut graph, x).unwrap();

            let y = graph.variable(y).unwrap();
            assert_eq!(y.order(), &order);
            assert_eq!(
                y.shape_dict(),
                dict(&[
                    (Axis::N, 3),
                    (Axis::H, expected_h),
                    (Axis::W, expected_w),
                    (Axis::C, 5)
                ])
            );
            let node = graph.operators().next().unwrap();
            assert_eq!(node.diagnostics().len(), usize::from(edge_ignored));
        }
    }
}

#[test]
fn spatial_operators_mark_every_non_spatial_axis_once() {
    for order in nhwc_orders() {
        let mut graph = Graph::new();
        let x = graph.add_input(
            Variable::new(vec![2, 8, 8, 4], ORDER_NHWC.clone())
                .unwrap()
                .change_order(&order)
                .unwrap(),
        );
        let w = graph.add_variable(Variable::new(vec![4, 3, 3, 6], ORDER_CHWN.clone()).unwrap());
        Pooling2D::average(2, 2, 0, false)
            .unwrap()
            .apply(&mut graph, x)
            .unwrap();
        Convolution2D::new(3, 1, 1)
            .unwrap()
            .apply(&mut graph, x, w)
            .unwrap();
        Deconvolution2D::new(3, 1, 1)
            .unwrap()
            .apply(&mut graph, x, w)
            .unwrap();

        let expected: Vec<Axis> = order
            .axes()
            .iter()
            .cloned()
            .filter(|axis| !axis.is_spatial())
            .collect();
        for node in graph.operators() {
            assert_eq!(node.tensorwise_axes(), expected);
            for attribute in node.attributes() {
                assert_eq!(attribute.operator(), node.id());
            }
        }
    }
}

#[test]
fn change_order_round_trips_over_all_permutations() {
    let base = Variable::new(vec![2, 3, 4, 5], ORDER_NHWC.clone()).unwrap();
    for start in all_permutations(&ORDER_NHWC) {
        let v = base.change_order(&start).unwrap();
        for target in all_permutations(&ORDER_NHWC) {
            let moved = v.change_order(&target).unwrap();
            assert_eq!(moved.shape_dict(), v.shape_dict());
            assert_eq!(moved.change_order(v.order()).unwrap(), v);
        }
    }
}

#[test]
fn invalid_parameters_are_rejected_before_inference() {
    for (ksize, stride, padding) in vec![(0, 1, 0), (-1, 1, 0), (2, 0, 0), (2, -2, 0), (2, 1, -1)] {
        assert!(matches!(
            Pooling2D::max(ksize, stride, padding),
            Err(IRError::InvalidParameter { .. })
        ));
        assert!(matches!(
            Convolution2D::new(ksize, stride, padding),
            Err(IRError::InvalidParameter { .. })
        ));
        assert!(matches!(
            Deconvolution2D::new(ksize, stride, padding),
            Err(IRError::InvalidParameter { .. })
        ));
    }
}

#[test]
fn finished_graph_is_shared_by_concurrent_readers() {
    fn assert_shareable<T: Send + Sync>() {}
    assert_shareable::<Graph>();

    let mut graph = Graph::new();
    let x = graph.add_input(Variable::new(vec![1, 3, 8, 8], ORDER_NCHW.clone()).unwrap());
    let y = Pooling2D::max(2, 2, 0).unwrap().apply(&mut graph, x).unwrap();
    let z = LogSoftmax::new(Axis::C).apply(&mut graph, y).unwrap();
    graph.mark_output(z).unwrap();

    crossbeam::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|_| {
                let ops = graph.listup_operators();
                assert_eq!(ops.len(), 2);
                let kinds: Vec<&str> = ops
                    .iter()
                    .map(|op| graph.operator(*op).unwrap().kind())
                    .collect();
                assert_eq!(kinds, vec!["MaxPooling2D", "LogSoftmax"]);
                let output = graph.variable(graph.outputs()[0]).unwrap();
                assert_eq!(output.order(), &*ORDER_NCHW);
            });
        }
    })
    .unwrap();
}
