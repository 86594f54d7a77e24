use ace_basis::{Environment, RpiBasis, RpiBasisParameters, Vector3D};

#[derive(serde::Deserialize)]
struct EnvironmentInput {
    center: i32,
    species: Vec<i32>,
    positions: Vec<[f64; 3]>,
}

#[derive(serde::Deserialize)]
struct Input {
    parameters: RpiBasisParameters,
    environments: Vec<EnvironmentInput>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // load the hyper-parameters and environments from the file given as
    // command line argument
    let path = std::env::args().nth(1).expect("expected a command line argument");
    let input: Input = serde_json::from_str(&std::fs::read_to_string(path)?)?;

    let environments = input.environments.into_iter()
        .map(|environment| Environment::from_parts(
            environment.center,
            environment.species,
            environment.positions.into_iter().map(Vector3D::from).collect(),
        ))
        .collect::<Vec<_>>();

    // create the basis, this computes all the coupling coefficients
    let basis = RpiBasis::from_parameters(input.parameters)?;
    for (&species, range) in basis.species().iter().zip(basis.bz0inds()) {
        println!("center species {}: basis functions {:?}", species, range);
    }

    // evaluate the basis on all environments in parallel, giving one row
    // for each environment
    let values = basis.compute_many(&environments)?;
    println!("RPI basis shape: {:?}", values.shape());

    // gradients are computed one environment at the time
    if let Some(environment) = environments.first() {
        let gradient = basis.compute_gradient(environment)?;
        println!("gradient of the first environment: {:?}", gradient.shape());
    }

    Ok(())
}
