use ferreus_rbffd::{
    DifferentialOperator,
    config::{PolynomialOrder, ShapeFactorParams},
    generate_random_points,
    kdtree::{KDTree, SpatialIndex},
    progress::{ProgressMsg, closure_sink},
    rbf_weights, shape_factor,
};
use ferreus_rbffd_utils::KernelType;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Scattered nodes in [0, 1]^2
    let nodes = generate_random_points(400, 2, Some(42));

    // Each node's stencil is its 20 nearest neighbours, itself included
    let tree = KDTree::new(&nodes);
    let stencils: Vec<Vec<usize>> = (0..nodes.nrows())
        .map(|i| tree.k_nearest(nodes.row(i), 20).into_iter().map(|(j, _)| j).collect())
        .collect();

    // Report shape factor estimation events as they arrive
    let (sink, listener) = closure_sink(64, |msg| match msg {
        ProgressMsg::ShapeFactorAccepted { alpha, successful, samples } => {
            println!("alpha = {alpha:.4e} ({successful}/{samples} stencils converged)")
        }
        ProgressMsg::ConditionSearchFailed { stencil, .. } => {
            println!("condition search failed on stencil {stencil}")
        }
        ProgressMsg::Message { message } => println!("{message}"),
    });

    let basis = KernelType::Multiquadric;
    let params = ShapeFactorParams::builder().sample_count(40).seed(7).build();
    let factors = shape_factor(&nodes, &stencils, &basis, None, &params, Some(sink))?;
    listener.join().ok();

    // Laplacian weights with quadratic polynomial augmentation
    let laplacian = DifferentialOperator::laplacian(2);
    let weights = rbf_weights(
        &nodes,
        &nodes,
        &stencils,
        &laplacian,
        &basis,
        PolynomialOrder::Fixed(3),
        &factors.eps,
    )?;

    // u = sin(x) cos(y) has laplacian -2 u
    let u: Vec<f64> = (0..nodes.nrows())
        .map(|i| nodes[(i, 0)].sin() * nodes[(i, 1)].cos())
        .collect();
    let approx = weights.apply(&u);
    let max_err = approx
        .iter()
        .zip(&u)
        .fold(0.0_f64, |acc, (a, u)| acc.max((a + 2.0 * u).abs()));
    println!("max laplacian error: {max_err:.3e}");

    let path = std::env::temp_dir().join("laplacian_2d_weights.json");
    weights.save(&path)?;
    println!("saved {} weights to {}", weights.triplets().len(), path.display());

    Ok(())
}
