//! A batch of identical, decoupled tradeoffs `min x + y^2  st  x >= 0.1, x + y >= 1`.
//! Each pair is optimal at `x = y = 0.5` with cost `0.75`, which is easy to verify by hand.

use approx::assert_abs_diff_eq;
use sp::prelude::*;

fn main() {
    let problem_size = 20;

    let mut objective = Posynomial::zero();
    let mut constraints = Vec::new();
    for i in 0..problem_size {
        let x = Monomial::var(&format!("x{i}"));
        let y = Monomial::var(&format!("y{i}"));
        objective = objective + x.clone() + y.powf(2.0);
        constraints.push(SignomialConstraint::posynomial(x.powf(-1.0) * 0.1));
        constraints.push(SignomialConstraint::new(Monomial::constant(2.0), x + y));
    }
    let program = constraints
        .into_iter()
        .fold(SignomialProgram::minimize(objective), |builder, c| builder.constraint(c))
        .build()
        .unwrap();

    let solver = LocalSolver::custom().reltol(1e-6).disp(true).build().unwrap();
    let solution = solver.solve(&program, &Barrier::default()).unwrap();

    println!("solution found, minimal cost: {}", solution.cost().unwrap());
    println!("required number of iterations: {}", solution.iterations());

    assert_eq!(solution.status(), Status::Converged);
    assert_abs_diff_eq!(
        solution.cost().unwrap(),
        0.75 * problem_size as f64,
        epsilon = 1e-3
    );
}
