//! Byte-for-byte file comparison with SHA-256 digests.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};

/// Block size used when walking both files.
const BLOCK_SIZE: usize = 4096;

/// Outcome of comparing two files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub len_a: u64,
    pub len_b: u64,
    /// Offset of the first differing byte, or of the end of the shorter
    /// file when one is a prefix of the other.
    pub first_difference: Option<u64>,
    pub sha256_a: String,
    pub sha256_b: String,
}

impl Comparison {
    pub fn identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Compares `a` and `b` block by block, hashing both along the way.
pub fn compare_files(a: &Path, b: &Path) -> anyhow::Result<Comparison> {
    let mut left = open(a)?;
    let mut right = open(b)?;

    let mut hash_a = Sha256::new();
    let mut hash_b = Sha256::new();
    let mut buf_a = [0u8; BLOCK_SIZE];
    let mut buf_b = [0u8; BLOCK_SIZE];
    let (mut len_a, mut len_b) = (0u64, 0u64);
    let mut first_difference = None;

    loop {
        let n_a = fill(&mut left, &mut buf_a).with_context(|| format!("reading {}", a.display()))?;
        let n_b =
            fill(&mut right, &mut buf_b).with_context(|| format!("reading {}", b.display()))?;

        if first_difference.is_none() {
            let common = n_a.min(n_b);
            if let Some(i) = buf_a[..common]
                .iter()
                .zip(&buf_b[..common])
                .position(|(x, y)| x != y)
            {
                first_difference = Some(len_a + i as u64);
            } else if n_a != n_b {
                first_difference = Some(len_a + common as u64);
            }
        }

        hash_a.update(&buf_a[..n_a]);
        hash_b.update(&buf_b[..n_b]);
        len_a += n_a as u64;
        len_b += n_b as u64;

        if n_a == 0 && n_b == 0 {
            break;
        }
    }

    Ok(Comparison {
        len_a,
        len_b,
        first_difference,
        sha256_a: hex::encode(hash_a.finalize()),
        sha256_b: hex::encode(hash_b.finalize()),
    })
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
