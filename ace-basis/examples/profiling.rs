use ace_basis::{Environment, RpiBasis, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    time_graph::spanned!("Full calculation", {
        let basis = RpiBasis::from_json(r#"{
            "species": [1, 8],
            "max_correlation": 3,
            "max_degree": 10,
            "cutoff": 5.0
        }"#)?;

        let environments = environments();
        for environment in &environments {
            basis.compute_gradient(environment)?;
        }
    });

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Water-like environments, with the oxygen neighbors of the second shell
fn environments() -> Vec<Environment> {
    let mut oxygen = Environment::new(8);
    oxygen.add_neighbor(1, Vector3D::new(0.757, 0.586, 0.0));
    oxygen.add_neighbor(1, Vector3D::new(-0.757, 0.586, 0.0));
    oxygen.add_neighbor(8, Vector3D::new(0.0, -2.8, 0.4));
    oxygen.add_neighbor(8, Vector3D::new(2.1, 1.2, 1.9));
    oxygen.add_neighbor(8, Vector3D::new(-1.7, 2.4, -1.1));

    let mut hydrogen = Environment::new(1);
    hydrogen.add_neighbor(8, Vector3D::new(-0.757, -0.586, 0.0));
    hydrogen.add_neighbor(1, Vector3D::new(-1.514, 0.0, 0.0));
    hydrogen.add_neighbor(8, Vector3D::new(1.3, 0.2, 0.1));

    return vec![oxygen, hydrogen];
}
