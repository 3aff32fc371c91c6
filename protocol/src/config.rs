//! # Protocol Configuration & Constants
//!
//! Every magic number in Gavel lives here. The ledger, the guard programs and
//! the node all read from this module, so a fee ceiling or a schema size is
//! declared exactly once.
//!
//! Amounts are in micro-units of the native currency. Rounds are the ledger's
//! logical clock; there is no wall-clock time anywhere in validation.

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for Gavel addresses.
pub const ADDRESS_HRP: &str = "gvl";

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Domain separator prepended to guard program bytes before hashing them into
/// an escrow address. Keeps program addresses disjoint from key-derived ones.
pub const PROGRAM_ADDRESS_PREFIX: &[u8] = b"Program";

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the ledger rules.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version byte carried in every transaction's canonical encoding.
pub const TRANSACTION_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Minimum fee every transaction must carry.
pub const MIN_TXN_FEE: u64 = 1_000;

/// Fee ceiling enforced by the custody guards on escrow-originated
/// transactions. Without it a third party could assemble a valid-looking
/// group that burns the escrow balance on fees.
pub const MAX_ESCROW_FEE: u64 = 1_000;

/// Amount the deployment sequence deposits into each escrow so it can pay
/// its own transaction fees.
pub const ESCROW_FEE_FLOAT: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Largest atomic group the ledger accepts.
pub const MAX_GROUP_SIZE: usize = 16;

/// Group size of the one-time configuration call.
pub const CONFIGURE_GROUP_SIZE: usize = 1;

/// Group size of a seller payout.
pub const PAYOUT_GROUP_SIZE: usize = 2;

/// Group size of a title claim.
pub const CLAIM_GROUP_SIZE: usize = 3;

/// Group size of a bid.
pub const BID_GROUP_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Integer slots declared by the auction contract: highest bid, start round,
/// end round.
pub const AUCTION_NUM_UINTS: u64 = 3;

/// Byte-string slots declared by the auction contract: current owner, asset
/// custody, funds custody, seller.
pub const AUCTION_NUM_BYTE_SLICES: u64 = 4;

/// Integer slots declared by the title contract: one record donation per title.
pub const TITLE_NUM_UINTS: u64 = 2;

/// Byte-string slots declared by the title contract: one holder per title plus
/// the custody address.
pub const TITLE_NUM_BYTE_SLICES: u64 = 3;

/// Maximum length of a state key in bytes.
pub const MAX_STATE_KEY_LENGTH: usize = 64;

/// Maximum length of a byte-string state value.
pub const MAX_STATE_VALUE_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Auction Defaults
// ---------------------------------------------------------------------------

/// Default auction duration in rounds.
pub const DEFAULT_AUCTION_DURATION: u64 = 150;

/// Total supply of the auctioned asset. It is unique, so exactly one.
pub const UNIQUE_ASSET_TOTAL: u64 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_ceiling_admits_minimum_fee() {
        // A guard that rejects the minimum fee would make every escrow unusable.
        assert!(MIN_TXN_FEE <= MAX_ESCROW_FEE);
    }

    #[test]
    fn group_shapes_are_distinct_and_bounded() {
        let shapes = [
            CONFIGURE_GROUP_SIZE,
            PAYOUT_GROUP_SIZE,
            CLAIM_GROUP_SIZE,
            BID_GROUP_SIZE,
        ];
        for (i, a) in shapes.iter().enumerate() {
            assert!(*a <= MAX_GROUP_SIZE);
            for b in &shapes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn auction_schema_matches_layout() {
        assert_eq!(AUCTION_NUM_UINTS, 3);
        assert_eq!(AUCTION_NUM_BYTE_SLICES, 4);
    }
}
