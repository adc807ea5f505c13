//! Quota, health check and timeout parameters
//!
//! Everything here is pure validation and runs before the first remote
//! mutation of a deploy.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cf_api::{HealthCheck, HealthCheckData, Process, ScaleProcessRequest, UpdateProcessRequest};
use tracing::{debug, warn};

use crate::config::settings::{HealthCheckConfig, QuotaConfig};
use crate::errors::PluginError;

/// Longest accepted health check timeout, in seconds
pub const MAX_HEALTH_CHECK_TIMEOUT: i64 = 180;

const BYTES_PER_MB: u128 = 1024 * 1024;

// ================================= QUOTA =================================== //

/// Zero in any field means "leave unchanged"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaParams {
    pub disk_mb: u64,
    pub memory_mb: u64,
    pub instances: u32,
}

impl QuotaParams {
    pub fn resolve(config: Option<&QuotaConfig>) -> Result<Self, PluginError> {
        let Some(config) = config else {
            return Ok(Self::default());
        };

        let mut params = Self {
            instances: config.instances,
            ..Self::default()
        };
        if !config.memory.is_empty() {
            params.memory_mb = parse_quantity(&config.memory)
                .map_err(|e| PluginError::Validation(format!("unable to parse memory: {}", e)))?;
        }
        if !config.disk.is_empty() {
            params.disk_mb = parse_quantity(&config.disk)
                .map_err(|e| PluginError::Validation(format!("unable to parse disk: {}", e)))?;
        }

        debug!(?params, "Resolved quota");
        Ok(params)
    }

    /// A single instance is the platform default and does not force a rescale
    pub fn needs_update(&self) -> bool {
        self.memory_mb != 0 || self.disk_mb != 0 || self.instances > 1
    }

    pub fn scale_request(&self) -> ScaleProcessRequest {
        ScaleProcessRequest {
            instances: (self.instances > 0).then_some(self.instances),
            memory_in_mb: (self.memory_mb > 0).then_some(self.memory_mb),
            disk_in_mb: (self.disk_mb > 0).then_some(self.disk_mb),
        }
    }
}

/// Parse a Kubernetes style quantity into whole megabytes
///
/// Accepts binary (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`) and decimal (`k`,
/// `M`, `G`, `T`, `P`, `E`) suffixes, a decimal exponent (`1e9`, `2E6`),
/// or none for bytes. The byte count must be a whole number; the megabyte
/// result is truncated.
pub fn parse_quantity(entry: &str) -> Result<u64, PluginError> {
    let invalid = || PluginError::Validation(format!("invalid quantity {:?}", entry));

    let s = entry.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.starts_with('-') {
        return Err(PluginError::Validation(format!(
            "quantity {:?} cannot be negative",
            entry
        )));
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let (multiplier, negative_exponent) = match decimal_exponent(suffix) {
        Some(exp) if exp >= 0 => (10u128.checked_pow(exp.unsigned_abs()).ok_or_else(invalid)?, 0),
        Some(exp) => (1, exp.unsigned_abs()),
        None => (suffix_multiplier(suffix).ok_or_else(invalid)?, 0),
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(invalid());
    }
    if whole.len() + fraction.len() > 30 {
        return Err(invalid());
    }

    let digits = format!("{}{}", whole, fraction);
    let mantissa: u128 = digits.parse().map_err(|_| invalid())?;
    let scale = 10u128
        .checked_pow(fraction.len() as u32 + negative_exponent)
        .ok_or_else(invalid)?;

    let scaled = mantissa.checked_mul(multiplier).ok_or_else(invalid)?;
    if scaled % scale != 0 {
        return Err(PluginError::Validation(format!(
            "quantity {:?} is not a whole number of bytes",
            entry
        )));
    }
    let bytes = scaled / scale;
    if bytes > i64::MAX as u128 {
        return Err(PluginError::Validation(format!("quantity {:?} is too large", entry)));
    }

    Ok((bytes / BYTES_PER_MB) as u64)
}

/// `e9`, `E-3`; a bare `E` is the exa suffix
fn decimal_exponent(suffix: &str) -> Option<i32> {
    let exp = suffix.strip_prefix(['e', 'E'])?;
    if exp.is_empty() {
        return None;
    }
    exp.parse().ok()
}

fn suffix_multiplier(suffix: &str) -> Option<u128> {
    let multiplier = match suffix {
        "" => 1,
        "Ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1 << 40,
        "Pi" => 1 << 50,
        "Ei" => 1 << 60,
        "k" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000,
        _ => return None,
    };
    Some(multiplier)
}

// ============================== HEALTH CHECK =============================== //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckKind {
    Port,
    Process,
    Http,
}

impl HealthCheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCheckKind::Port => "port",
            HealthCheckKind::Process => "process",
            HealthCheckKind::Http => "http",
        }
    }
}

impl fmt::Display for HealthCheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthCheckKind {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "port" => Ok(HealthCheckKind::Port),
            "process" => Ok(HealthCheckKind::Process),
            "http" => Ok(HealthCheckKind::Http),
            other => Err(PluginError::Validation(format!(
                "unknown health check type {:?}, expected port, process or http",
                other
            ))),
        }
    }
}

/// Validated health check settings; `None` kind keeps the process's current type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckParams {
    pub kind: Option<HealthCheckKind>,
    pub endpoint: String,
    pub invocation_timeout: u32,
    pub timeout: u32,
}

impl HealthCheckParams {
    pub fn resolve(config: Option<&HealthCheckConfig>) -> Result<Self, PluginError> {
        let Some(config) = config else {
            return Ok(Self::default());
        };

        let kind = match config.kind.trim() {
            "" => None,
            kind => Some(kind.parse::<HealthCheckKind>()?),
        };

        if kind == Some(HealthCheckKind::Http) && config.endpoint.is_empty() {
            return Err(PluginError::Validation(
                "undefined endpoint for HTTP health check".to_string(),
            ));
        }

        let invocation_timeout = check_timeout(config.invocation_timeout)
            .ok_or_else(|| PluginError::Validation("invocation timeout has to be 0-180s".to_string()))?;
        let timeout = check_timeout(config.timeout)
            .ok_or_else(|| PluginError::Validation("timeout has to be 0-180s".to_string()))?;

        let params = Self {
            kind,
            endpoint: config.endpoint.clone(),
            invocation_timeout,
            timeout,
        };
        debug!(?params, "Resolved health check");
        Ok(params)
    }

    pub fn needs_update(&self) -> bool {
        self.kind.is_some()
            || !self.endpoint.is_empty()
            || self.invocation_timeout != 0
            || self.timeout != 0
    }

    /// Overlay the set fields onto the process's current health check
    pub fn update_request(&self, process: &Process) -> UpdateProcessRequest {
        let current = process.health_check.as_ref();

        let kind = self
            .kind
            .map(|k| k.as_str().to_string())
            .or_else(|| current.map(|hc| hc.kind.clone()))
            .unwrap_or_else(|| HealthCheckKind::Port.as_str().to_string());
        let current_data = current.map(|hc| &hc.data);

        let timeout = if self.timeout != 0 {
            Some(self.timeout)
        } else {
            current_data.and_then(|d| d.timeout)
        };

        // endpoint and invocation timeout are only valid for http checks
        let (endpoint, invocation_timeout) = if kind == HealthCheckKind::Http.as_str() {
            let endpoint = if self.endpoint.is_empty() {
                current_data.and_then(|d| d.endpoint.clone())
            } else {
                Some(self.endpoint.clone())
            };
            let invocation_timeout = if self.invocation_timeout != 0 {
                Some(self.invocation_timeout)
            } else {
                current_data.and_then(|d| d.invocation_timeout)
            };
            (endpoint, invocation_timeout)
        } else {
            (None, None)
        };

        UpdateProcessRequest {
            health_check: HealthCheck {
                kind,
                data: HealthCheckData {
                    timeout,
                    invocation_timeout,
                    endpoint,
                },
            },
        }
    }
}

fn check_timeout(seconds: i64) -> Option<u32> {
    (0..=MAX_HEALTH_CHECK_TIMEOUT)
        .contains(&seconds)
        .then_some(seconds as u32)
}

// ================================ TIMEOUTS ================================= //

/// Resolve a duration string, falling back to `default` when empty or zero
pub fn resolve_timeout(value: &str, default: Duration, what: &str) -> Result<Duration, PluginError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(default);
    }

    let duration = parse_duration(value)
        .map_err(|e| PluginError::Validation(format!("invalid {}: {}", what, e)))?;
    if duration.is_zero() {
        warn!(
            "{} is zero, using the default of {}s",
            what,
            default.as_secs()
        );
        return Ok(default);
    }
    Ok(duration)
}

/// Parse a duration such as `"90s"`, `"1h30m"`, `"1.5m"` or `"250ms"`
///
/// A bare `"0"` is accepted; any other number needs a unit. Negative
/// durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let original = s;
    let mut rest = s;
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('+') {
        rest = r;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(format!("invalid duration {:?}", original));
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(format!("invalid duration {:?}", original));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration {:?}", original))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let unit_nanos = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {:?}", original)),
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, original)),
        };

        total_nanos += value * unit_nanos;
        rest = tail;
    }

    if negative && total_nanos > 0.0 {
        return Err(format!("duration {:?} cannot be negative", original));
    }
    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration {:?} is too large", original));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
