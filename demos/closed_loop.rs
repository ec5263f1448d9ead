use model_matching::io::{AttitudeSample, Mixer, RateSample};
use model_matching::sim::{AirframeParams, SimulatedVehicle};
use model_matching::{ControlConfig, ControlCore};
use nalgebra::Vector2;

const TICK_US: u32 = 1_000;

// Closed loop on the simulated airframe: a roll/pitch step, a motor stop
// and a restart. Pass a JSON config path to override the reference design.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| ControlConfig::from_json_str(&json).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                println!("Failed to load {}: {}", path, e);
                return;
            }
        },
        None => ControlConfig::default(),
    };

    let mut core = match ControlCore::new(&config) {
        Ok(core) => core,
        Err(e) => {
            println!("Configuration rejected: {}", e);
            return;
        }
    };

    let mut vehicle = SimulatedVehicle::new(AirframeParams::default());
    vehicle.reference = Vector2::new(10.0, -5.0);

    for k in 0..8_000u32 {
        // Motors stopped between 4 s and 5 s.
        vehicle.motors_stopped = (4_000..5_000).contains(&k);

        core.step_attitude(&AttitudeSample::read(&vehicle, &vehicle, &vehicle));
        let out = core.step_rate(&RateSample::read(&vehicle, &vehicle, &vehicle));
        vehicle.publish_control_action(out.total);

        if let Err(e) = vehicle.advance(TICK_US) {
            println!("Simulation failed: {}", e);
            return;
        }

        if k % 500 == 0 {
            let snapshot = core.snapshot();
            println!(
                "t={:.1}s attitude=({:.3}, {:.3}) setpoint=({:.3}, {:.3}) action=({:.4}, {:.4})",
                k as f64 * 1e-3,
                vehicle.state.roll,
                vehicle.state.pitch,
                snapshot.rate_setpoint.x,
                snapshot.rate_setpoint.y,
                snapshot.total.x,
                snapshot.total.y
            );
        }
    }

    match core.snapshot().encode() {
        Ok(frame) => println!("Last telemetry frame: {} bytes", frame.len()),
        Err(e) => println!("Telemetry encoding failed: {}", e),
    }
}
