// NVML field ids queried through nvmlDeviceGetFieldValues

use nvml_wrapper::Device;
use nvml_wrapper::enums::device::SampleValue;
use nvml_wrapper::error::{NvmlError, nvml_try};
use nvml_wrapper::struct_wrappers::device::FieldValueSample;
use nvml_wrapper::structs::device::FieldId;
use nvml_wrapper::sys_exports::field_id::*;
use nvml_wrapper_sys::bindings::{NvmlLib, nvmlFieldValue_t};

/// Scope id meaning "summed over every link" for per-link NVLink fields.
pub(super) const ALL_LINKS: u32 = u32::MAX;

/// RX then TX, KiB, scoped to all links. `Device::field_values_for` always
/// sends scope 0 (link 0 only), so these go through the raw call.
pub(super) fn nvlink_throughput_request() -> [nvmlFieldValue_t; 2] {
    [
        NVML_FI_DEV_NVLINK_THROUGHPUT_DATA_RX,
        NVML_FI_DEV_NVLINK_THROUGHPUT_DATA_TX,
    ]
    .map(|field| {
        // SAFETY: plain C struct (integers and a numeric union); all-zero is valid.
        let mut raw: nvmlFieldValue_t = unsafe { std::mem::zeroed() };
        raw.fieldId = field;
        raw.scopeId = ALL_LINKS;
        raw
    })
}

/// Runs a prepared field-value request; one result per requested field.
pub(super) fn query_scoped(
    lib: &NvmlLib,
    device: &Device<'_>,
    request: &mut [nvmlFieldValue_t],
) -> Result<Vec<Result<SampleValue, NvmlError>>, NvmlError> {
    let sym = lib
        .nvmlDeviceGetFieldValues
        .as_ref()
        .map_err(|e| NvmlError::FailedToLoadSymbol(e.to_string()))?;
    // SAFETY: the handle comes from a live `Device` borrowed from an initialised
    // `Nvml`; `request` is a valid buffer of `request.len()` entries.
    unsafe {
        nvml_try(sym(
            device.handle(),
            request.len() as i32,
            request.as_mut_ptr(),
        ))?;
    }
    Ok(request
        .iter()
        .map(|raw| FieldValueSample::try_from(*raw).and_then(|sample| sample.value))
        .collect())
}

/// Per-link speed fields known to the driver API, MiB/s. Boards expose a
/// subset; the rest come back as errors and are ignored.
pub(super) const NVLINK_LINK_SPEEDS: [FieldId; 12] = [
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L0),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L1),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L2),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L3),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L4),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L5),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L6),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L7),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L8),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L9),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L10),
    FieldId(NVML_FI_DEV_NVLINK_SPEED_MBPS_L11),
];

/// Negative or fractional samples clamp to whole, non-negative units.
pub(super) fn sample_to_u64(value: SampleValue) -> u64 {
    match value {
        SampleValue::U32(v) => u64::from(v),
        SampleValue::U64(v) => v,
        SampleValue::I64(v) => v.max(0) as u64,
        SampleValue::F64(v) if v.is_finite() && v > 0.0 => v as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvlink_throughput_request_covers_every_link() {
        let request = nvlink_throughput_request();
        assert_eq!(request[0].fieldId, NVML_FI_DEV_NVLINK_THROUGHPUT_DATA_RX);
        assert_eq!(request[1].fieldId, NVML_FI_DEV_NVLINK_THROUGHPUT_DATA_TX);
        for raw in &request {
            assert_eq!(raw.scopeId, u32::MAX);
        }
    }

    #[test]
    fn samples_clamp_to_unsigned() {
        assert_eq!(sample_to_u64(SampleValue::I64(-5)), 0);
        assert_eq!(sample_to_u64(SampleValue::F64(f64::NAN)), 0);
        assert_eq!(sample_to_u64(SampleValue::F64(2.9)), 2);
        assert_eq!(sample_to_u64(SampleValue::U32(7)), 7);
    }
}
