//! Reference design coefficient tables.
//!
//! All values were fixed offline by identification and pole placement. The
//! engine never computes or adapts them at runtime. Arrays are ordered
//! `[c0, c1, ...]` with `c0` weighting the newest sample.
#![allow(clippy::excessive_precision)]

/// Sample period the reference models were discretized with (s).
pub const MODEL_TS: f64 = 0.001;
/// Nominal rate recorded for the compensators and feedforward stages (Hz).
pub const COMPENSATOR_SAMPLE_RATE_HZ: f64 = 100.0;
/// Nominal rate of the reference models (Hz).
pub const MODEL_SAMPLE_RATE_HZ: f64 = 1.0 / MODEL_TS;

// Second-order closed-loop model shared by roll and pitch.
pub const MODEL_A1: f64 = -1.988365969464611;
pub const MODEL_A0: f64 = 0.988399807131236;
/// Unit steady-state gain.
pub const MODEL_B0: f64 = 1.0 + MODEL_A1 + MODEL_A0;

pub const ATTITUDE_MODEL_NUM: [f64; 3] = [0.0, 0.0, MODEL_B0];
pub const ATTITUDE_MODEL_DEN: [f64; 3] = [1.0, MODEL_A1, MODEL_A0];
pub const ATTITUDE_MODEL_LIMIT: f64 = 45.0;

/// Attitude model followed by a backward difference over `MODEL_TS`.
pub const RATE_MODEL_NUM: [f64; 4] = [0.0, 0.0, MODEL_B0 / MODEL_TS, -MODEL_B0 / MODEL_TS];
pub const RATE_MODEL_DEN: [f64; 4] = [1.0, MODEL_A1, MODEL_A0, 0.0];
pub const RATE_MODEL_LIMIT: f64 = 2000.0;

// Attitude-loop compensators (C1).
pub const ROLL_C1_NUM: [f64; 4] = [0.001080332551071, -0.001079518817226, 0.0, 0.0];
pub const ROLL_C1_DEN: [f64; 4] = [
    1.000000000000000,
    -2.962840136697706,
    2.925954655478638,
    -0.963114518780933,
];
pub const PITCH_C1_NUM: [f64; 4] = [
    0.046804980158302,
    -0.093419592114382,
    0.046614702814919,
    0.0,
];
pub const PITCH_C1_DEN: [f64; 4] = [
    1.000000000000000,
    -2.978476662009833,
    2.957044182859258,
    -0.978567520849425,
];
pub const C1_LIMIT: f64 = 2000.0;

// Rate-loop compensators (C2).
pub const ROLL_C2_NUM: [f64; 4] = [
    0.012510069026241,
    -0.024547894599545,
    0.012041446603292,
    0.0,
];
pub const ROLL_C2_DEN: [f64; 4] = [
    1.000000000000000,
    -2.946258464464385,
    2.896013098191188,
    -0.949744366519786,
];
pub const PITCH_C2_NUM: [f64; 3] = [0.0, 1.0, -0.996137478799238];
pub const PITCH_C2_DEN: [f64; 3] = [1.000000000000000, -1.941301330791778, 0.941699963348203];
pub const C2_LIMIT: f64 = 10000.0;

// Feedforward, roll. Stage one is a pass-through.
pub const ROLL_FF1_NUM: [f64; 3] = [1.0, 0.0, 0.0];
pub const ROLL_FF1_DEN: [f64; 3] = [1.0, 0.0, 0.0];
pub const ROLL_FF1_LIMIT: f64 = 1000.0;
pub const ROLL_FF2_NUM: [f64; 3] = [0.296302070293102, -0.592604140586204, 0.296302070293102];
pub const ROLL_FF2_DEN: [f64; 3] = [1.000000000000000, -1.985222009931781, 0.985307862384168];
pub const ROLL_FF2_LIMIT: f64 = 1000.0;

// Feedforward, pitch. Stage one is a second difference with lightly damped poles.
pub const PITCH_FF1_NUM: [f64; 3] = [1.0, -2.0, 1.0];
pub const PITCH_FF1_DEN: [f64; 3] = [1.000000000000000, -1.987222293777649, 0.987255922757562];
pub const PITCH_FF1_LIMIT: f64 = 1000.0;
pub const PITCH_FF2_NUM: [f64; 2] = [0.017001, -0.016353596713012];
pub const PITCH_FF2_DEN: [f64; 2] = [1.000000000000000, -0.882963730894899];
pub const PITCH_FF2_LIMIT: f64 = 1.0;

// Calibration gains from compensator units to mixer units.
pub const ROLL_FEEDBACK_GAIN: f64 = 0.001;
pub const PITCH_FEEDBACK_GAIN: f64 = 0.00010203;
// The two axes' feedforward paths were identified in different units.
pub const ROLL_FEEDFORWARD_GAIN: f64 = 0.001;
pub const PITCH_FEEDFORWARD_GAIN: f64 = 1.0;
