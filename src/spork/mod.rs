//! Spork governance - signed, network-propagated configuration values
//!
//! A spork is a named value the governance key holder can change
//! post-deployment; nodes apply the newest validly signed value per id.

mod message;
mod registry;

pub use message::*;
pub use registry::*;

/// Timestamp-gated sporks with this value are permanently off (2099-01-01).
pub const SPORK_OFF: i64 = 4_070_908_800;

/// Collateral-tier thresholds default to this sentinel, which covers every
/// realistic block height.
pub const TIER_OPEN: i64 = 99_999_999;

/// The closed spork id set.
///
/// Wire codes are never reused once assigned: a retired code that came back
/// with a different meaning would be misread by old nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SporkId {
    FastTx,
    FastTxBlockFiltering,
    MaxValue,
    MasternodeScanning,
    MasternodePaymentEnforcement,
    MasternodeBudgetEnforcement,
    MasternodePayUpdatedNodes,
    ResetBudget,
    ReconsiderBlocks,
    EnableSuperblocks,
    NewProtocolEnforcement,
    NewProtocolEnforcement2,
    MnWinnerMinimumAge,
    Collateral01,
    Collateral02,
    Collateral03,
    Collateral04,
    Collateral05,
    Collateral06,
    Collateral07,
    Collateral08,
    Collateral09,
    Collateral10,
    Collateral11,
}

/// One row per spork: id, wire code, symbolic name, compiled-in default.
const SPORK_TABLE: &[(SporkId, i32, &str, i64)] = &[
    (SporkId::FastTx, 10001, "SPORK_2_FAST_TX", 978_307_200),
    (SporkId::FastTxBlockFiltering, 10002, "SPORK_3_FAST_TX_BLOCK_FILTERING", 1_424_217_600),
    (SporkId::MaxValue, 10004, "SPORK_5_MAX_VALUE", 1000),
    (SporkId::MasternodeScanning, 10006, "SPORK_7_MASTERNODE_SCANNING", 978_307_200),
    (SporkId::MasternodePaymentEnforcement, 10007, "SPORK_8_MASTERNODE_PAYMENT_ENFORCEMENT", SPORK_OFF),
    (SporkId::MasternodeBudgetEnforcement, 10008, "SPORK_9_MASTERNODE_BUDGET_ENFORCEMENT", SPORK_OFF),
    (SporkId::MasternodePayUpdatedNodes, 10009, "SPORK_10_MASTERNODE_PAY_UPDATED_NODES", SPORK_OFF),
    (SporkId::ResetBudget, 10010, "SPORK_11_RESET_BUDGET", 0),
    (SporkId::ReconsiderBlocks, 10011, "SPORK_12_RECONSIDER_BLOCKS", 0),
    (SporkId::EnableSuperblocks, 10012, "SPORK_13_ENABLE_SUPERBLOCKS", SPORK_OFF),
    (SporkId::NewProtocolEnforcement, 10013, "SPORK_14_NEW_PROTOCOL_ENFORCEMENT", SPORK_OFF),
    (SporkId::NewProtocolEnforcement2, 10014, "SPORK_15_NEW_PROTOCOL_ENFORCEMENT_2", SPORK_OFF),
    (SporkId::MnWinnerMinimumAge, 10015, "SPORK_16_MN_WINNER_MINIMUM_AGE", 8000),
    (SporkId::Collateral01, 10016, "SPORK_17_COLLAT_01", TIER_OPEN),
    (SporkId::Collateral02, 10017, "SPORK_18_COLLAT_02", TIER_OPEN),
    (SporkId::Collateral03, 10018, "SPORK_19_COLLAT_03", TIER_OPEN),
    (SporkId::Collateral04, 10019, "SPORK_20_COLLAT_04", TIER_OPEN),
    (SporkId::Collateral05, 10020, "SPORK_21_COLLAT_05", TIER_OPEN),
    (SporkId::Collateral06, 10021, "SPORK_22_COLLAT_06", TIER_OPEN),
    (SporkId::Collateral07, 10022, "SPORK_23_COLLAT_07", TIER_OPEN),
    (SporkId::Collateral08, 10023, "SPORK_24_COLLAT_08", TIER_OPEN),
    (SporkId::Collateral09, 10024, "SPORK_25_COLLAT_09", TIER_OPEN),
    (SporkId::Collateral10, 10025, "SPORK_26_COLLAT_10", TIER_OPEN),
    (SporkId::Collateral11, 10026, "SPORK_27_COLLAT_11", TIER_OPEN),
];

impl SporkId {
    /// All known sporks, in table order
    pub fn all() -> impl Iterator<Item = SporkId> {
        SPORK_TABLE.iter().map(|(id, _, _, _)| *id)
    }

    /// Wire code for this spork
    pub fn code(&self) -> i32 {
        self.row().1
    }

    /// Symbolic name
    pub fn name(&self) -> &'static str {
        self.row().2
    }

    /// Compiled-in default value
    pub fn default_value(&self) -> i64 {
        self.row().3
    }

    /// Look up a spork by wire code; unknown codes map to `None`
    pub fn from_code(code: i32) -> Option<SporkId> {
        SPORK_TABLE.iter().find(|(_, c, _, _)| *c == code).map(|(id, _, _, _)| *id)
    }

    /// Look up a spork by symbolic name; unknown names map to `None`
    pub fn from_name(name: &str) -> Option<SporkId> {
        SPORK_TABLE.iter().find(|(_, _, n, _)| *n == name).map(|(id, _, _, _)| *id)
    }

    fn row(&self) -> &'static (SporkId, i32, &'static str, i64) {
        SPORK_TABLE
            .iter()
            .find(|(id, _, _, _)| id == self)
            .expect("every SporkId variant has a table row")
    }
}
