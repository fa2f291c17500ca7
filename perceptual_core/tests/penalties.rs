use std::collections::HashMap;

use ndarray::{s, Array1, Array2, Array4, ArrayD, IxDyn};
use perceptual_core::{
    dummy_loss, psnr, psnr_loss, ActivityPenalty, AdversarialRegularizer, ContentRegularizer,
    DataLayout, EvalContext, LossError, LossHead, Objective, ObjectiveConfig, Regularizer,
    TotalVariationRegularizer, PSNR_MAX_255_DB,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RANDOM_SEED: u64 = 42;

fn random_tensor(rng: &mut StdRng, shape: &[usize]) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(shape), |_| rng.gen_range(0.0..1.0))
}

#[test]
fn psnr_loss_of_identical_images_is_infinite() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let ctx = EvalContext::default();
    for shape in [vec![1, 8, 8, 3], vec![16], vec![2, 3, 5]] {
        let a = random_tensor(&mut rng, &shape);
        let loss = psnr_loss(&ctx, &a, &a).unwrap();
        assert!(loss.is_infinite() && loss > 0.0);
    }
}

#[test]
fn psnr_loss_exceeds_psnr_by_peak_term() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let ctx = EvalContext::default();
    let a = random_tensor(&mut rng, &[2, 16, 16, 3]);
    let b = random_tensor(&mut rng, &[2, 16, 16, 3]);
    let metric = psnr(&ctx, &a, &b).unwrap();
    let loss = psnr_loss(&ctx, &a, &b).unwrap();
    assert!((loss - metric - PSNR_MAX_255_DB as f32).abs() < 1e-3);
}

#[test]
fn psnr_error_names_both_shapes() {
    let ctx = EvalContext::default();
    let a = Array4::<f32>::zeros((1, 4, 4, 3));
    let b = Array4::<f32>::zeros((1, 4, 4, 1));
    let err = psnr(&ctx, &a, &b).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("[1, 4, 4, 3]"));
    assert!(message.contains("[1, 4, 4, 1]"));
}

#[test]
fn dummy_loss_is_zero_for_any_inputs() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let a = random_tensor(&mut rng, &[3, 7]);
    let b = random_tensor(&mut rng, &[0]);
    assert_eq!(dummy_loss(&a, &b), 0.0);
    assert_eq!(dummy_loss(&b, &a), 0.0);
    assert_eq!(dummy_loss(&Array1::<f32>::zeros(0), &Array1::<f32>::zeros(0)), 0.0);
}

#[test]
fn content_penalty_vanishes_for_matching_halves() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let half = Array4::<f32>::from_shape_fn((3, 4, 4, 8), |_| rng.gen_range(0.0..1.0));
    let mut batch = Array4::<f32>::zeros((6, 4, 4, 8));
    batch.slice_mut(s![..3, .., .., ..]).assign(&half);
    batch.slice_mut(s![3.., .., .., ..]).assign(&half);

    let penalty = ContentRegularizer::new(2.0)
        .penalty(&EvalContext::default(), &batch.view().into_dyn())
        .unwrap();
    assert_eq!(penalty, 0.0);
}

#[test]
fn content_penalty_grows_with_squared_perturbation() {
    let ctx = EvalContext::default();
    let regularizer = ContentRegularizer::new(2.0);
    let mut previous = 0.0;
    for d in [0.25f32, 0.5, 1.0, 2.0] {
        let mut batch = Array2::<f32>::from_elem((2, 5), 0.5);
        batch[[0, 3]] += d;
        let penalty = regularizer.penalty(&ctx, &batch.view().into_dyn()).unwrap();
        assert!((penalty - 2.0 * d * d).abs() < 1e-5);
        assert!(penalty > previous);
        previous = penalty;
    }
}

#[test]
fn adversarial_penalty_bounds() {
    let ctx = EvalContext::default();
    let regularizer = AdversarialRegularizer::new(1e-3);

    let real = Array1::<f32>::from_elem(32, 40.0);
    let confident = regularizer.penalty(&ctx, &real.view().into_dyn()).unwrap();
    assert!((confident - 1e-3).abs() < 1e-8);

    let fake = Array1::<f32>::from_elem(32, -40.0);
    let penalised = regularizer.penalty(&ctx, &fake.view().into_dyn()).unwrap();
    assert!(penalised > confident);
    assert!((penalised - 1e-3 * 41.0).abs() < 1e-6);
}

#[test]
fn total_variation_is_zero_on_flat_images_and_positive_on_ramps() {
    let ctx = EvalContext::default();
    let tv = TotalVariationRegularizer::new(4, 4).with_weight(1.0);

    let flat = Array4::<f32>::from_elem((2, 4, 4, 3), 0.7);
    assert_eq!(tv.penalty(&ctx, &flat.view().into_dyn()).unwrap(), 0.0);

    let mut previous = 0.0;
    for step in [0.05f32, 0.1, 0.2] {
        let ramp = Array4::<f32>::from_shape_fn((2, 4, 4, 3), |(_, _, y, _)| y as f32 * step);
        let penalty = tv.penalty(&ctx, &ramp.view().into_dyn()).unwrap();
        assert!(penalty > previous);
        previous = penalty;
    }
}

#[test]
fn total_variation_layouts_agree_on_transposed_input() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let ctx = EvalContext::default();
    let last = Array4::<f32>::from_shape_fn((2, 6, 5, 3), |_| rng.gen_range(0.0..1.0));
    let first = last.view().permuted_axes([0, 3, 1, 2]).to_owned();

    let tv_last = TotalVariationRegularizer::new(6, 5)
        .with_weight(1.0)
        .with_layout(DataLayout::ChannelsLast);
    let tv_first = tv_last.with_layout(DataLayout::ChannelsFirst);

    let a = tv_last.penalty(&ctx, &last.view().into_dyn()).unwrap();
    let b = tv_first.penalty(&ctx, &first.view().into_dyn()).unwrap();
    assert!((a - b).abs() <= 1e-5 * a.abs());
}

#[test]
fn total_variation_rejects_non_image_tensors() {
    let x = Array2::<f32>::zeros((4, 4));
    let err = TotalVariationRegularizer::new(4, 4)
        .penalty(&EvalContext::default(), &x.view().into_dyn())
        .unwrap_err();
    assert!(matches!(err, LossError::RankMismatch { expected: 4, got: 2, .. }));
}

#[test]
fn exported_configs_match_construction() {
    let content = ContentRegularizer::new(0.5).config();
    assert_eq!(content.weight, 0.5);

    let adversarial = AdversarialRegularizer::new(2e-3).config();
    assert_eq!(adversarial.weight, 2e-3);

    let tv = TotalVariationRegularizer::new(128, 96).with_weight(1e-7).config();
    assert_eq!(tv.weight, 1e-7);
    assert_eq!(tv.img_width, Some(128));
    assert_eq!(tv.img_height, Some(96));
}

#[test]
fn objective_from_toml_evaluates_every_layer() {
    let config = ObjectiveConfig::from_str(
        r#"
        [objective]
        loss = "dummy"
        layout = "channels_last"

        [[objective.regularizers]]
        layer = "vgg_block3"
        kind = "content"

        [[objective.regularizers]]
        layer = "discriminator"
        kind = "adversarial"

        [[objective.regularizers]]
        layer = "output"
        kind = "total_variation"
        weight = 1.0
        img_width = 8
        img_height = 8
        "#,
    )
    .unwrap();
    let objective = Objective::from_config(&config).unwrap();
    assert_eq!(objective.head(), LossHead::Dummy);
    assert!(matches!(
        objective.attachments()[2].1,
        Regularizer::TotalVariation(_)
    ));

    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    let features = random_tensor(&mut rng, &[4, 4, 4, 16]);
    let logits = random_tensor(&mut rng, &[2, 1]);
    let image = random_tensor(&mut rng, &[2, 8, 8, 3]);

    let mut activations = HashMap::new();
    activations.insert("vgg_block3".to_string(), features.view());
    activations.insert("discriminator".to_string(), logits.view());
    activations.insert("output".to_string(), image.view());

    let report = objective
        .evaluate(&config.context(), &image, &image, &activations)
        .unwrap();
    assert_eq!(report.loss, 0.0);
    assert_eq!(report.penalties.len(), 3);
    assert!(report.penalties.iter().all(|entry| entry.penalty > 0.0));
    let sum: f32 = report.penalties.iter().map(|entry| entry.penalty).sum();
    assert!((report.total - sum).abs() <= 1e-5 * sum);
}
