use model_matching::io::AttitudeSample;
use model_matching::{Axis, ControlConfig, ControlCore};
use nalgebra::Vector2;

// Step response of the attitude reference and rate models, no airframe.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let mut core = match ControlCore::new(&ControlConfig::default()) {
        Ok(core) => core,
        Err(e) => {
            println!("Configuration rejected: {}", e);
            return;
        }
    };

    let model = &core.attitude().bank().axis(Axis::Roll).attitude_model;
    tracing::info!(
        dc_gain = ?model.dc_gain(),
        pole_radius = model.pole_radius(),
        "attitude model"
    );

    let step = Vector2::new(10.0, -10.0);
    println!("tick,roll_ref,roll_rate_ref,pitch_ref,pitch_rate_ref");
    for k in 0..3000u32 {
        let out = core.step_attitude(&AttitudeSample {
            reference: step,
            attitude: Vector2::zeros(),
            rate: Vector2::zeros(),
            motors_stopped: false,
            now_us: k * 1_000,
        });
        if k % 100 == 0 {
            println!(
                "{},{:.4},{:.4},{:.4},{:.4}",
                k,
                out.attitude_reference.x,
                out.model_rate_reference.x,
                out.attitude_reference.y,
                out.model_rate_reference.y
            );
        }
    }
}
