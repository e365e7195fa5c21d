//! Memo transaction construction
//!
//! Every attempt builds a fresh legacy message carrying a single memo
//! instruction. Signatures are left as placeholders for the wallet to fill.

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{Message, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

/// SPL memo program
pub const MEMO_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Payload written by every memo instruction
pub const MEMO_TEXT: &str = "Hello, from the Solana Wallet Adapter example app!";

/// Memo instruction with no account keys
pub fn memo_instruction() -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![],
        data: MEMO_TEXT.as_bytes().to_vec(),
    }
}

/// Compile a legacy memo message paid by `payer` and wrap it as an unsigned
/// versioned transaction
pub fn build_legacy_memo_transaction(payer: &Pubkey, recent_blockhash: Hash) -> VersionedTransaction {
    let message = Message::new_with_blockhash(&[memo_instruction()], Some(payer), &recent_blockhash);
    let required_signatures = message.header.num_required_signatures as usize;

    VersionedTransaction {
        signatures: vec![Signature::default(); required_signatures],
        message: VersionedMessage::Legacy(message),
    }
}

/// Memo bytes of a transaction built by [`build_legacy_memo_transaction`]
pub fn memo_payload(transaction: &VersionedTransaction) -> Option<&[u8]> {
    let keys = transaction.message.static_account_keys();
    transaction
        .message
        .instructions()
        .iter()
        .find(|ix| keys.get(ix.program_id_index as usize) == Some(&MEMO_PROGRAM_ID))
        .map(|ix| ix.data.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_instruction_shape() {
        let ix = memo_instruction();
        assert_eq!(ix.program_id.to_string(), "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");
        assert!(ix.accounts.is_empty());
        assert_eq!(ix.data, MEMO_TEXT.as_bytes());
    }

    #[test]
    fn test_legacy_memo_transaction() {
        let payer = Pubkey::new_unique();
        let blockhash = Hash::new_unique();
        let tx = build_legacy_memo_transaction(&payer, blockhash);

        assert!(matches!(tx.message, VersionedMessage::Legacy(_)));
        assert_eq!(tx.signatures, vec![Signature::default()]);
        assert_eq!(*tx.message.recent_blockhash(), blockhash);
        assert_eq!(tx.message.static_account_keys()[0], payer);

        let instructions = tx.message.instructions();
        assert_eq!(instructions.len(), 1);
        assert!(instructions[0].accounts.is_empty());
        assert_eq!(memo_payload(&tx), Some(MEMO_TEXT.as_bytes()));
    }

    #[test]
    fn test_each_build_is_independent() {
        let payer = Pubkey::new_unique();
        let first = build_legacy_memo_transaction(&payer, Hash::new_unique());
        let second = build_legacy_memo_transaction(&payer, Hash::new_unique());
        assert_ne!(first.message.recent_blockhash(), second.message.recent_blockhash());
    }
}
