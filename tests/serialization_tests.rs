//! Wire-format tests against the mainnet genesis block

use anyhow::Result;
use consensus_core::hash::{hash_from_hex, hash_to_hex};
use consensus_core::serialize::*;
use consensus_core::*;

const GENESIS_BLOCK_HEX: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
const GENESIS_MERKLE_ROOT: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

fn genesis_bytes() -> Result<Vec<u8>> {
    Ok(hex::decode(GENESIS_BLOCK_HEX)?)
}

#[test]
fn test_genesis_block_decodes() -> Result<()> {
    let block = deserialize_block(&genesis_bytes()?)?;

    assert_eq!(block.header.version, 1);
    assert_eq!(block.header.prev_block_hash, [0u8; 32]);
    assert_eq!(block.header.timestamp, 1231006505);
    assert_eq!(block.header.bits, 0x1d00ffff);
    assert_eq!(block.header.nonce, 2083236893);
    assert_eq!(hash_to_hex(&block.header.merkle_root), GENESIS_MERKLE_ROOT);

    assert_eq!(block.transactions.len(), 1);
    let coinbase = &block.transactions[0];
    assert!(coinbase.inputs[0].prevout.is_null());
    assert_eq!(coinbase.inputs[0].script_sig.len(), 77);
    assert_eq!(coinbase.outputs[0].value, 50 * SATOSHIS_PER_BTC);
    assert_eq!(coinbase.outputs[0].script_pubkey.len(), 67);
    Ok(())
}

#[test]
fn test_genesis_hashes() -> Result<()> {
    let block = deserialize_block(&genesis_bytes()?)?;
    assert_eq!(hash_to_hex(&block.hash()), GENESIS_HASH);
    // single transaction: the merkle root is its txid
    assert_eq!(hash_to_hex(&block.transactions[0].hash()), GENESIS_MERKLE_ROOT);
    assert_eq!(hash_from_hex(GENESIS_HASH), Some(block.header.compute_hash()));
    Ok(())
}

#[test]
fn test_genesis_reserializes_identically() -> Result<()> {
    let bytes = genesis_bytes()?;
    let block = deserialize_block(&bytes)?;

    assert_eq!(serialize_block(&block), bytes);
    assert_eq!(block_size(&block), 285);
    assert_eq!(serialize_block_header(&block.header), bytes[..80].to_vec());
    assert_eq!(transaction_size(&block.transactions[0]), 204);
    assert_eq!(
        deserialize_transaction(&bytes[81..])?,
        block.transactions[0]
    );
    assert_eq!(deserialize_block_header(&bytes[..80])?, block.header);
    Ok(())
}

#[test]
fn test_truncated_block_rejected() -> Result<()> {
    let bytes = genesis_bytes()?;
    for cut in [0, 40, 80, 81, 150, bytes.len() - 1] {
        let err = deserialize_block(&bytes[..cut]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization, "cut at {}", cut);
    }
    Ok(())
}

#[test]
fn test_trailing_bytes_rejected() -> Result<()> {
    let mut bytes = genesis_bytes()?;
    bytes.push(0);
    assert!(matches!(
        deserialize_block(&bytes),
        Err(ConsensusError::Serialization(_))
    ));
    Ok(())
}

#[test]
fn test_non_canonical_tx_count_rejected() -> Result<()> {
    let bytes = genesis_bytes()?;
    // transaction count 1 encoded as 0xfd 0x01 0x00
    let mut padded = bytes[..80].to_vec();
    padded.extend_from_slice(&[0xfd, 0x01, 0x00]);
    padded.extend_from_slice(&bytes[81..]);
    assert!(deserialize_block(&padded).is_err());
    Ok(())
}

#[test]
fn test_varint_boundaries() {
    assert_eq!(encode_varint(0xfc), vec![0xfc]);
    assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
    assert_eq!(encode_varint(0xffff), vec![0xfd, 0xff, 0xff]);
    assert_eq!(encode_varint(0x10000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    assert_eq!(encode_varint(0x1_0000_0000).len(), 9);
}
