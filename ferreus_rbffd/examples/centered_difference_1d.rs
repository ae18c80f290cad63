use faer::mat;
use ferreus_rbffd::{
    DifferentialOperator, config::PolynomialOrder, poly_weight, rbf_weight,
};
use ferreus_rbffd_utils::KernelType;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three equally spaced nodes around the evaluation point
    let nodes = mat![[-1.0], [0.0], [1.0]];
    let d_dx = DifferentialOperator::partial(1, 0, 1);

    // The maximum polynomial order for three 1D nodes spans {1, x, x^2}
    let rbf = rbf_weight(&[0.0], &nodes, &d_dx, None, &KernelType::Phs3, PolynomialOrder::Max, 1.0)?;
    println!("RBF-FD weights:     {rbf:?}");

    // The pure polynomial stencil gives the same classical weights
    let poly = poly_weight(&[0.0], &nodes, &d_dx)?;
    println!("polynomial weights: {poly:?}");

    // Off-centre evaluation with a second derivative
    let d2_dx2 = DifferentialOperator::partial(1, 0, 2);
    let shifted = rbf_weight(&[0.3], &nodes, &d2_dx2, None, &KernelType::Phs3, PolynomialOrder::Max, 1.0)?;
    println!("d2/dx2 at x = 0.3:  {shifted:?}");

    Ok(())
}
