// Prints the variance report and the first projected rows for the iris data.
//
// RUST_LOG=debug cargo run --example iris_report

use correlation_pca::{PcaError, PCA};

#[path = "../tests/common/iris.rs"]
mod iris;

fn main() -> Result<(), PcaError> {
    env_logger::init();

    let data = iris::iris_data();
    let labels = iris::iris_labels();

    let mut pca = PCA::with_components(2);
    pca.fit(data.view())?;
    let result = pca.result()?;

    println!("Samples: {}, features: {}", data.nrows(), data.ncols());
    println!("Correlation matrix:");
    for (name, row) in iris::IRIS_FEATURES.iter().zip(result.covariance().rows()) {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>7.3}", v)).collect();
        println!("  {:<13}{}", name, cells.join(""));
    }

    println!("\n{:>9} {:>11} {:>11} {:>12}", "Component", "Eigenvalue", "Explained%", "Cumulative%");
    let ranked = result.ranked_eigenvalues();
    for (i, ((lambda, pct), cum)) in ranked
        .iter()
        .zip(result.explained_variance().iter())
        .zip(result.cumulative_explained_variance().iter())
        .enumerate()
    {
        println!("{:>9} {:>11.4} {:>11.2} {:>12.2}", i + 1, lambda, pct, cum);
    }
    println!(
        "\nKaiser's rule keeps {} component(s); 95% of variance needs {}.",
        result.kaiser_component_count(),
        result.components_for_variance(95.0)
    );

    let projected = pca.transform()?;
    println!("\n{:>5} {:>7} {:>9} {:>9}", "Row", "Label", "PC1", "PC2");
    for row in (0..projected.nrows()).step_by(25) {
        println!(
            "{:>5} {:>7} {:>9.4} {:>9.4}",
            row, labels[row], projected[[row, 0]], projected[[row, 1]]
        );
    }
    Ok(())
}
