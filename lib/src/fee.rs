//! Lease fee curve.
//!
//! `rate(lease) = base + max_extra / (1 + e^(-(lease - shift) / span))`
//!
//! Wasm contracts cannot use floating point, so the curve is evaluated in
//! fixed point (`RATE_SCALE`). The exponent is the truncated integer step
//! `(lease - shift) / span`, which makes `e^step` a table lookup and keeps
//! every replica on identical integer arithmetic.
use soroban_sdk::{contracttype, Bytes, String};

use crate::{
    errors::CrudError, DEFAULT_FEE_BASE_RATE, DEFAULT_FEE_INFLECTION_SPAN, DEFAULT_FEE_MAX_EXTRA,
    DEFAULT_FEE_SHIFT, MAX_FEE_EXTRA, RATE_SCALE,
};

/// Largest step looked up. Beyond it the logistic term is within 1e-9 of
/// its limit.
const MAX_STEP: usize = 40;

/// `round(e^k * RATE_SCALE)` for `k = 0..=MAX_STEP`.
const EXP_TABLE: [i128; MAX_STEP + 1] = [
    1_000_000_000,
    2_718_281_828,
    7_389_056_099,
    20_085_536_923,
    54_598_150_033,
    148_413_159_103,
    403_428_793_493,
    1_096_633_158_428,
    2_980_957_987_042,
    8_103_083_927_575,
    22_026_465_794_807,
    59_874_141_715_198,
    162_754_791_419_004,
    442_413_392_008_921,
    1_202_604_284_164_777,
    3_269_017_372_472_111,
    8_886_110_520_507_873,
    24_154_952_753_575_298,
    65_659_969_137_330_511,
    178_482_300_963_187_261,
    485_165_195_409_790_278,
    1_318_815_734_483_214_697,
    3_584_912_846_131_591_562,
    9_744_803_446_248_902_600,
    26_489_122_129_843_472_294,
    72_004_899_337_385_872_524,
    195_729_609_428_838_764_270,
    532_048_240_601_798_616_684,
    1_446_257_064_291_475_173_677,
    3_931_334_297_144_042_074_389,
    10_686_474_581_524_462_146_990,
    29_048_849_665_247_425_231_086,
    78_962_960_182_680_695_160_978,
    214_643_579_785_916_064_624_298,
    583_461_742_527_454_881_402_903,
    1_586_013_452_313_430_728_129_645,
    4_311_231_547_115_195_227_113_422,
    11_719_142_372_802_611_308_772_940,
    31_855_931_757_113_756_220_328_672,
    86_593_400_423_993_746_953_606_933,
    235_385_266_837_019_985_407_899_911,
];

/// Constants of the logistic lease fee curve. Rates are fixed point with
/// `RATE_SCALE` == 1.0.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct FeeCurve {
    pub base_rate: i128,
    pub max_extra: i128,
    pub inflection_span: i64,
    pub shift: i64,
}

impl FeeCurve {
    pub fn default_curve() -> Self {
        FeeCurve {
            base_rate: DEFAULT_FEE_BASE_RATE,
            max_extra: DEFAULT_FEE_MAX_EXTRA,
            inflection_span: DEFAULT_FEE_INFLECTION_SPAN,
            shift: DEFAULT_FEE_SHIFT,
        }
    }

    pub fn validate(&self) -> Result<(), CrudError> {
        if self.inflection_span <= 0 {
            return Err(CrudError::InvalidRequest);
        }
        if self.base_rate < 0 || self.base_rate > MAX_FEE_EXTRA {
            return Err(CrudError::InvalidRequest);
        }
        if self.max_extra < 0 || self.max_extra > MAX_FEE_EXTRA {
            return Err(CrudError::InvalidRequest);
        }
        Ok(())
    }

    /// Per-byte fee rate for a lease of `lease` ledgers, scaled by
    /// `RATE_SCALE`. Expects a validated curve.
    pub fn rate(&self, lease: i64) -> i128 {
        let step = lease.saturating_sub(self.shift) / self.inflection_span;
        let k = core::cmp::min(step.unsigned_abs(), MAX_STEP as u64) as usize;
        let exp = EXP_TABLE[k];

        // 1 / (1 + e^-step), scaled.
        let frac = if step >= 0 {
            exp * RATE_SCALE / (exp + RATE_SCALE)
        } else {
            RATE_SCALE * RATE_SCALE / (RATE_SCALE + exp)
        };

        self.base_rate + self.max_extra * frac / RATE_SCALE
    }

    /// Full fee for a fresh lease term over `byte_size` bytes.
    pub fn lease_fee(&self, lease: i64, byte_size: u32) -> u64 {
        scaled_to_fee(self.rate(lease) * byte_size as i128)
    }

    /// Incremental fee for moving from `old_lease` to `new_lease`. Shortenings
    /// are free and never refunded.
    pub fn extension_fee(&self, old_lease: i64, new_lease: i64, byte_size: u32) -> u64 {
        if new_lease <= old_lease {
            return 0;
        }
        let delta = self.rate(new_lease) - self.rate(old_lease);
        scaled_to_fee(delta * byte_size as i128)
    }
}

/// Truncates a scaled amount to whole fee units.
fn scaled_to_fee(scaled: i128) -> u64 {
    if scaled <= 0 {
        return 0;
    }
    u64::try_from(scaled / RATE_SCALE).unwrap_or(u64::MAX)
}

/// Billable size of a record: namespace, key and value byte lengths.
pub fn byte_size(uuid: &String, key: &String, value: &Bytes) -> u32 {
    uuid.len()
        .saturating_add(key.len())
        .saturating_add(value.len())
}
