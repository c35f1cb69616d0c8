//! Pyramid-textured silicon wafer example.
//!
//! Traces a 200 µm wafer with upright pyramids on the front and a flat
//! back, then prints reflection, transmission and absorption per wavelength.

use texray_core::texture::{planar, regular_pyramids};
use texray_core::{Medium, Stack};
use texray_tracer::{sweep, SweepConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    println!("texray - Pyramid Wafer Example");
    println!("==============================");

    let wavelengths = vec![900.0, 1000.0, 1100.0];
    // Rough crystalline silicon constants near the band edge
    let n = [3.60, 3.57, 3.55];
    let k = [2.3e-4, 1.6e-5, 3.5e-7];

    let stack = Stack::new(
        vec![
            Medium::constant("air", 1.0, 0.0, &wavelengths),
            Medium::from_nk("si", &wavelengths, &n, &k),
            Medium::constant("air", 1.0, 0.0, &wavelengths),
        ],
        vec![
            regular_pyramids(10.0, 54.7f64.to_radians())?,
            planar(10.0, 10.0, 0.0)?,
        ],
        vec![200.0],
    )?;

    let config = SweepConfig {
        wavelengths,
        n_rays: 20_000,
        nx: 10,
        ny: 10,
        depth_spacing: 1.0,
        n_theta_bins: 20,
        random_angles: true,
        seed: 1,
        ..Default::default()
    };

    let start = std::time::Instant::now();
    let output = sweep(&stack, &config)?;
    println!("Traced in {:?}", start.elapsed());
    println!();

    println!("{:>10} {:>8} {:>8} {:>8}", "nm", "R", "T", "A");
    for result in &output.wavelengths {
        let absorbed: f64 = result
            .layer_absorption
            .iter()
            .map(|layers| layers[1])
            .sum::<f64>()
            / result.layer_absorption.len() as f64;
        println!(
            "{:>10.1} {:>8.4} {:>8.4} {:>8.4}",
            result.wavelength, result.reflected, result.transmitted, absorbed
        );
    }

    Ok(())
}
