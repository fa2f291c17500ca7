use std::collections::HashMap;

use ndarray::{s, Array2, Array4};
use perceptual_core::config::ConfigError;
use perceptual_core::logging;
use perceptual_core::{psnr, Objective, ObjectiveConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    println!(
        "Loaded config: loss={:?} layout={} regularizers={}",
        config.loss,
        config.layout,
        config.regularizers.len()
    );

    let ctx = config.context();
    let objective = Objective::from_config(&config)?;

    // Stand-ins for what the network would hand over each step
    let target = Array4::<f32>::from_shape_fn((2, 64, 64, 3), |(_, x, y, c)| {
        ((x + y + c) % 16) as f32 / 16.0
    });
    let mut output = target.clone();
    output.slice_mut(s![.., 16..48, 16..48, ..]).mapv_inplace(|v| (v + 0.1).min(1.0));

    let mut features = Array4::<f32>::zeros((4, 16, 16, 32));
    features
        .slice_mut(s![..2, .., .., ..])
        .assign(&Array4::from_elem((2, 16, 16, 32), 0.25));
    let logits = Array2::<f32>::from_shape_fn((2, 1), |(n, _)| n as f32 - 0.5);

    let mut activations = HashMap::new();
    activations.insert("vgg_block2_conv2".to_string(), features.view().into_dyn());
    activations.insert("discriminator".to_string(), logits.view().into_dyn());
    activations.insert("generator_output".to_string(), output.view().into_dyn());

    for iteration in 0..3 {
        let report = objective.evaluate(&ctx, &target, &output, &activations)?;
        logging::log_penalty_report(iteration, &report)?;
        for entry in &report.penalties {
            println!(
                "[{iteration}] {:<20} {:<28} {:.6e}",
                entry.layer, entry.regularizer, entry.penalty
            );
        }
        println!("[{iteration}] total {:.6e}", report.total);
    }

    println!("PSNR {:.3} dB", psnr(&ctx, &target, &output)?);
    Ok(())
}

fn load_config() -> Result<ObjectiveConfig, ConfigError> {
    ObjectiveConfig::load_from_file("config/objective.toml").or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        Ok(ObjectiveConfig::default())
    })
}
