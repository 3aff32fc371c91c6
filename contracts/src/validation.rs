//! Predicates over transaction groups, shared by contracts and guards.
//!
//! Each `expect_*` helper pins one group position to one transaction kind and
//! hands back the fields the caller needs as a small `Copy` struct, so the
//! rule code reads as a list of equalities instead of nested matches.

use gavel_protocol::config::MAX_ESCROW_FEE;
use gavel_protocol::identity::Address;
use gavel_protocol::transaction::{Transaction, TransactionGroup, TransactionKind, TransactionType};

use crate::error::AuctionError;

/// Fields of an application call at a known group position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppCallFields {
    pub sender: Address,
    pub app_id: u64,
}

/// Fields of a payment at a known group position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentFields {
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
}

/// Fields of an asset transfer at a known group position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTransferFields {
    pub sender: Address,
    pub asset_id: u64,
    pub amount: u64,
    pub receiver: Address,
    pub asset_sender: Option<Address>,
}

/// Fail with `err` unless `condition` holds.
pub fn ensure(condition: bool, err: AuctionError) -> Result<(), AuctionError> {
    if condition {
        Ok(())
    } else {
        Err(err)
    }
}

/// The transaction at `index` must be a call to `app_id`.
pub fn expect_app_call(
    group: &TransactionGroup,
    index: usize,
    app_id: u64,
) -> Result<AppCallFields, AuctionError> {
    match group.get(index) {
        Some(tx) => match tx.kind {
            TransactionKind::ApplicationCall { app_id: called, .. } if called == app_id => {
                Ok(AppCallFields {
                    sender: tx.sender,
                    app_id: called,
                })
            }
            TransactionKind::ApplicationCall { app_id: called, .. } => {
                Err(AuctionError::WrongApplication {
                    expected: app_id,
                    found: Some(called),
                })
            }
            _ => Err(AuctionError::WrongApplication {
                expected: app_id,
                found: None,
            }),
        },
        None => Err(AuctionError::WrongTransactionType {
            index,
            expected: TransactionType::ApplicationCall,
        }),
    }
}

/// The transaction at `index` must be a payment.
pub fn expect_payment(group: &TransactionGroup, index: usize) -> Result<PaymentFields, AuctionError> {
    match group.get(index).map(|tx| (tx.sender, &tx.kind)) {
        Some((
            sender,
            TransactionKind::Payment {
                receiver, amount, ..
            },
        )) => Ok(PaymentFields {
            sender,
            receiver: *receiver,
            amount: *amount,
        }),
        _ => Err(AuctionError::WrongTransactionType {
            index,
            expected: TransactionType::Payment,
        }),
    }
}

/// The transaction at `index` must be an asset transfer.
pub fn expect_asset_transfer(
    group: &TransactionGroup,
    index: usize,
) -> Result<AssetTransferFields, AuctionError> {
    match group.get(index).map(|tx| (tx.sender, &tx.kind)) {
        Some((
            sender,
            TransactionKind::AssetTransfer {
                asset_id,
                amount,
                receiver,
                asset_sender,
                ..
            },
        )) => Ok(AssetTransferFields {
            sender,
            asset_id: *asset_id,
            amount: *amount,
            receiver: *receiver,
            asset_sender: *asset_sender,
        }),
        _ => Err(AuctionError::WrongTransactionType {
            index,
            expected: TransactionType::AssetTransfer,
        }),
    }
}

/// Decode call argument `index` as a 32-byte address.
pub fn decode_address_arg(args: &[Vec<u8>], index: usize) -> Result<Address, AuctionError> {
    let raw = args.get(index).ok_or_else(|| AuctionError::MalformedArgument {
        index,
        reason: "missing".into(),
    })?;
    Address::try_from(raw.as_slice()).map_err(|e| AuctionError::MalformedArgument {
        index,
        reason: e.to_string(),
    })
}

/// Decode a big-endian unsigned integer of at most 8 bytes. The empty
/// string decodes as zero.
pub fn btoi(bytes: &[u8]) -> Result<u64, AuctionError> {
    if bytes.len() > 8 {
        return Err(AuctionError::MalformedArgument {
            index: 0,
            reason: format!("integer argument is {} bytes (max 8)", bytes.len()),
        });
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Decode call argument `index` with [`btoi`].
pub fn decode_uint_arg(args: &[Vec<u8>], index: usize) -> Result<u64, AuctionError> {
    let raw = args.get(index).ok_or_else(|| AuctionError::MalformedArgument {
        index,
        reason: "missing".into(),
    })?;
    btoi(raw).map_err(|e| match e {
        AuctionError::MalformedArgument { reason, .. } => AuctionError::MalformedArgument { index, reason },
        other => other,
    })
}

/// Encode `value` the way [`btoi`] decodes it: 8 bytes, big-endian.
pub fn itob(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Safety conditions every escrow-originated transaction must meet: a
/// bounded fee, no account-closing recipient, no rekey.
pub fn check_escrow_safety(tx: &Transaction) -> Result<(), AuctionError> {
    ensure(
        tx.fee <= MAX_ESCROW_FEE,
        AuctionError::EscrowFeeTooHigh {
            fee: tx.fee,
            max: MAX_ESCROW_FEE,
        },
    )?;
    ensure(tx.close_to().is_none(), AuctionError::EscrowCloseTo)?;
    ensure(tx.rekey_to.is_none(), AuctionError::EscrowRekey)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_protocol::transaction::TransactionBuilder;

    fn a() -> Address {
        Address::derive(b"a")
    }

    fn b() -> Address {
        Address::derive(b"b")
    }

    fn mixed_group() -> TransactionGroup {
        TransactionGroup::new(vec![
            TransactionBuilder::app_call(a(), 11).build(),
            TransactionBuilder::payment(a(), b(), 500).build(),
            TransactionBuilder::asset_transfer(b(), 3, 1, a())
                .revocation_target(b())
                .build(),
        ])
        .unwrap()
    }

    #[test]
    fn expect_helpers_extract_fields() {
        let group = mixed_group();
        assert_eq!(expect_app_call(&group, 0, 11).unwrap().sender, a());
        assert_eq!(
            expect_payment(&group, 1).unwrap(),
            PaymentFields {
                sender: a(),
                receiver: b(),
                amount: 500
            }
        );
        let xfer = expect_asset_transfer(&group, 2).unwrap();
        assert_eq!(xfer.asset_id, 3);
        assert_eq!(xfer.asset_sender, Some(b()));
    }

    #[test]
    fn expect_helpers_reject_wrong_kind_or_position() {
        let group = mixed_group();
        assert!(matches!(
            expect_app_call(&group, 0, 12),
            Err(AuctionError::WrongApplication {
                expected: 12,
                found: Some(11)
            })
        ));
        assert!(matches!(
            expect_app_call(&group, 1, 11),
            Err(AuctionError::WrongApplication { found: None, .. })
        ));
        assert!(matches!(
            expect_payment(&group, 2),
            Err(AuctionError::WrongTransactionType { index: 2, .. })
        ));
        assert!(expect_asset_transfer(&group, 7).is_err());
    }

    #[test]
    fn btoi_is_big_endian() {
        assert_eq!(btoi(&[]).unwrap(), 0);
        assert_eq!(btoi(&[0x96]).unwrap(), 150);
        assert_eq!(btoi(&[0x01, 0x00]).unwrap(), 256);
        assert_eq!(btoi(&itob(150)).unwrap(), 150);
        assert!(btoi(&[0u8; 9]).is_err());
    }

    #[test]
    fn uint_arg_reports_its_index() {
        let args = vec![vec![1u8], vec![0u8; 9]];
        assert_eq!(decode_uint_arg(&args, 0).unwrap(), 1);
        assert!(matches!(
            decode_uint_arg(&args, 1),
            Err(AuctionError::MalformedArgument { index: 1, .. })
        ));
        assert!(matches!(
            decode_uint_arg(&args, 2),
            Err(AuctionError::MalformedArgument { index: 2, .. })
        ));
    }

    #[test]
    fn address_args_must_be_32_bytes() {
        let args = vec![a().as_bytes().to_vec(), vec![1, 2, 3]];
        assert_eq!(decode_address_arg(&args, 0).unwrap(), a());
        assert!(decode_address_arg(&args, 1).is_err());
        assert!(decode_address_arg(&args, 2).is_err());
    }

    #[test]
    fn escrow_safety_checks() {
        let ok = TransactionBuilder::payment(a(), b(), 1).build();
        assert!(check_escrow_safety(&ok).is_ok());

        let pricey = TransactionBuilder::payment(a(), b(), 1)
            .fee(MAX_ESCROW_FEE + 1)
            .build();
        assert!(matches!(
            check_escrow_safety(&pricey),
            Err(AuctionError::EscrowFeeTooHigh { .. })
        ));

        let closing = TransactionBuilder::payment(a(), b(), 1).close_to(b()).build();
        assert_eq!(check_escrow_safety(&closing), Err(AuctionError::EscrowCloseTo));

        let asset_close = TransactionBuilder::asset_transfer(a(), 3, 1, b())
            .close_to(b())
            .build();
        assert_eq!(check_escrow_safety(&asset_close), Err(AuctionError::EscrowCloseTo));

        let rekey = TransactionBuilder::payment(a(), b(), 1).rekey_to(b()).build();
        assert_eq!(check_escrow_safety(&rekey), Err(AuctionError::EscrowRekey));
    }
}
