use num_traits::float::Float;

/// Linearly map `num` from the range `[in_min, in_max]` to the range `[out_min, out_max]`
pub fn linear_map<T: Float>(num: T, in_min: T, in_max: T, out_min: T, out_max: T) -> T {
    let out_delta = out_max - out_min;
    let in_delta = in_max - in_min;
    ((num - in_min) / in_delta) * out_delta + out_min
}

/// Integer version of [`linear_map`], rounding towards zero like the pulse
/// calibration always has. An empty input range maps nothing and returns `num`.
pub fn scale_range(num: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let out_delta = out_max - out_min;
    let in_delta = in_max - in_min;
    match (out_delta * (num - in_min)).checked_div(in_delta) {
        Some(scaled) => scaled - out_delta + out_max,
        None => num,
    }
}
