//! Legacy (non-witness) Bitcoin wire serialization

use crate::constants::{BLOCK_HEADER_SIZE, MAX_SIZE};
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// Encode a number as a Bitcoin varint (CompactSize)
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    write_varint(&mut out, value);
    out
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        out.push(value as u8);
    } else if value <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffffffff {
        out.push(0xfe);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn write_transaction(out: &mut Vec<u8>, tx: &Transaction) {
    out.extend_from_slice(&tx.version.to_le_bytes());

    write_varint(out, tx.inputs.len() as u64);
    for input in &tx.inputs {
        out.extend_from_slice(&input.prevout.hash);
        out.extend_from_slice(&input.prevout.index.to_le_bytes());
        write_bytes(out, &input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_varint(out, tx.outputs.len() as u64);
    for output in &tx.outputs {
        out.extend_from_slice(&output.value.to_le_bytes());
        write_bytes(out, &output.script_pubkey);
    }

    out.extend_from_slice(&tx.lock_time.to_le_bytes());
}

pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let mut out = Vec::with_capacity(transaction_size(tx));
    write_transaction(&mut out, tx);
    out
}

/// 80-byte header serialization
pub fn serialize_block_header(header: &BlockHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE);
    out.extend_from_slice(&header.version.to_le_bytes());
    out.extend_from_slice(&header.prev_block_hash);
    out.extend_from_slice(&header.merkle_root);
    out.extend_from_slice(&header.timestamp.to_le_bytes());
    out.extend_from_slice(&header.bits.to_le_bytes());
    out.extend_from_slice(&header.nonce.to_le_bytes());
    out
}

pub fn serialize_block(block: &Block) -> Vec<u8> {
    let mut out = serialize_block_header(&block.header);
    write_varint(&mut out, block.transactions.len() as u64);
    for tx in &block.transactions {
        write_transaction(&mut out, tx);
    }
    out
}

fn varint_size(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffffffff => 5,
        _ => 9,
    }
}

/// Serialized transaction length, computed without allocating
pub fn transaction_size(tx: &Transaction) -> usize {
    let inputs: usize = tx
        .inputs
        .iter()
        .map(|i| 32 + 4 + varint_size(i.script_sig.len() as u64) + i.script_sig.len() + 4)
        .sum();
    let outputs: usize = tx
        .outputs
        .iter()
        .map(|o| 8 + varint_size(o.script_pubkey.len() as u64) + o.script_pubkey.len())
        .sum();

    4 + varint_size(tx.inputs.len() as u64)
        + inputs
        + varint_size(tx.outputs.len() as u64)
        + outputs
        + 4
}

/// Serialized block length
pub fn block_size(block: &Block) -> usize {
    BLOCK_HEADER_SIZE
        + varint_size(block.transactions.len() as u64)
        + block.transactions.iter().map(transaction_size).sum::<usize>()
}

/// Cursor over a byte slice for decoding
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                ConsensusError::Serialization(format!(
                    "unexpected end of data at offset {} (need {} bytes)",
                    self.pos, n
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn varint(&mut self) -> Result<u64> {
        let tag = self.array::<1>()?[0];
        let (value, min) = match tag {
            0xfd => (u16::from_le_bytes(self.array()?) as u64, 0xfd),
            0xfe => (u32::from_le_bytes(self.array()?) as u64, 0x10000),
            0xff => (u64::from_le_bytes(self.array()?), 0x1_0000_0000),
            n => return Ok(n as u64),
        };
        if value < min {
            return Err(ConsensusError::Serialization(format!(
                "non-canonical varint {:#x}",
                value
            )));
        }
        Ok(value)
    }

    fn length(&mut self) -> Result<usize> {
        let len = self.varint()?;
        if len > MAX_SIZE {
            return Err(ConsensusError::Serialization(format!(
                "length {} exceeds maximum {}",
                len, MAX_SIZE
            )));
        }
        Ok(len as usize)
    }

    fn bytes(&mut self) -> Result<ByteString> {
        let len = self.length()?;
        Ok(self.take(len)?.to_vec())
    }

    fn transaction(&mut self) -> Result<Transaction> {
        let version = self.u32()?;

        let input_count = self.length()?;
        let mut inputs = Vec::with_capacity(input_count.min(1024));
        for _ in 0..input_count {
            let hash = self.array()?;
            let index = self.u32()?;
            let script_sig = self.bytes()?;
            let sequence = self.u32()?;
            inputs.push(TransactionInput {
                prevout: OutPoint { hash, index },
                script_sig,
                sequence,
            });
        }

        let output_count = self.length()?;
        let mut outputs = Vec::with_capacity(output_count.min(1024));
        for _ in 0..output_count {
            let value = i64::from_le_bytes(self.array()?);
            let script_pubkey = self.bytes()?;
            outputs.push(TransactionOutput {
                value,
                script_pubkey,
            });
        }

        let lock_time = self.u32()?;
        Ok(Transaction::new(version, inputs, outputs, lock_time))
    }

    fn header(&mut self) -> Result<BlockHeader> {
        let version = i32::from_le_bytes(self.array()?);
        let prev_block_hash = self.array()?;
        let merkle_root = self.array()?;
        let timestamp = self.u32()?;
        let bits = self.u32()?;
        let nonce = self.u32()?;
        Ok(BlockHeader::new(
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
        ))
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.data.len() {
            return Err(ConsensusError::Serialization(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

pub fn deserialize_transaction(data: &[u8]) -> Result<Transaction> {
    let mut reader = Reader::new(data);
    let tx = reader.transaction()?;
    reader.finish()?;
    Ok(tx)
}

pub fn deserialize_block_header(data: &[u8]) -> Result<BlockHeader> {
    let mut reader = Reader::new(data);
    let header = reader.header()?;
    reader.finish()?;
    Ok(header)
}

pub fn deserialize_block(data: &[u8]) -> Result<Block> {
    let mut reader = Reader::new(data);
    let header = reader.header()?;
    let count = reader.length()?;
    let mut transactions = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        transactions.push(reader.transaction()?);
    }
    reader.finish()?;
    Ok(Block {
        header,
        transactions,
    })
}
