use std::time::Duration;

pub(crate) fn format_bytes(b: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    if b >= GIB {
        return format!("{:.2}GiB", (b as f64) / (GIB as f64));
    }
    if b >= MIB {
        return format!("{:.2}MiB", (b as f64) / (MIB as f64));
    }
    if b >= KIB {
        return format!("{:.2}KiB", (b as f64) / (KIB as f64));
    }

    format!("{b}B")
}

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.1}")
    } else {
        "0".to_string()
    }
}

/// One rounded component in us, ms or s. Sub-second values keep one decimal in ms.
pub(crate) fn format_duration(d: Duration) -> String {
    let us = d.as_micros();
    if us >= 1_000_000 {
        return format!("{:.2}s", d.as_secs_f64());
    }
    if us >= 1_000 {
        return format!("{:.1}ms", (us as f64) / 1000.0);
    }
    format!("{us}us")
}

pub(crate) fn format_micros(us: u64) -> String {
    format_duration(Duration::from_micros(us))
}

pub(crate) fn format_micros_f64(us: f64) -> String {
    if us.is_finite() && us >= 0.0 {
        format_duration(Duration::from_secs_f64(us / 1_000_000.0))
    } else {
        "-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2.00KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 + 512 * 1024), "3.50MiB");
    }

    #[test]
    fn durations_pick_one_unit() {
        assert_eq!(format_duration(Duration::from_micros(850)), "850us");
        assert_eq!(format_duration(Duration::from_micros(12_340)), "12.3ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_micros(2_000), "2.0ms");
        assert_eq!(format_micros_f64(f64::NAN), "-");
    }
}
