//! Digest algorithm catalogue and multi-lane hashing.
//!
//! The provider is the RustCrypto `digest` family; algorithm handles are
//! [`AlgoKind`] values resolved from provider names. [`DigestList`] holds
//! the enumerated catalogue (alias spellings folded onto their canonical
//! entry) and hands out [`MultiHasher`] passes that feed every selected
//! algorithm the same byte stream in a single read.

use blake2::{Blake2b512, Blake2s256};
use digest::crypto_common::BlockSizeUser;
use digest::{Digest, DynDigest};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use tracing::debug;

use crate::errors::{HashmvError, Result};

/// Provider names of this length or longer are rejected at enumeration.
pub const MAX_NAME_LEN: usize = 64;

/// Name fragments marking signature schemes and protocol-bound digests,
/// which are not pure hashes and never enter the catalogue.
const EXCLUDED_FRAGMENTS: &[&str] = &["rsa", "ssl3", "md5-sha1"];

/// Provider enumeration in sorted order: every spelling the provider
/// answers to, alias spellings and protocol-bound names included.
const PROVIDER_CATALOG: &[&str] = &[
    "blake2b512",
    "blake2s256",
    "md5",
    "md5-sha1",
    "rsa-sha1",
    "rsa-sha256",
    "rsa-sha512",
    "sha1",
    "sha224",
    "sha256",
    "sha3-224",
    "sha3-256",
    "sha3-384",
    "sha3-512",
    "sha384",
    "sha512",
    "sha512-224",
    "sha512-256",
    "sha512/224",
    "sha512/256",
    "ssl3-md5",
    "ssl3-sha1",
];

/// Opaque algorithm handle resolved from a provider name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoKind {
    Blake2b512,
    Blake2s256,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl AlgoKind {
    /// Resolve a normalized (lowercase) provider name. The SHA-512
    /// truncations answer to both their hyphen and slash spellings.
    fn resolve(name: &str) -> Option<Self> {
        Some(match name {
            "blake2b512" => Self::Blake2b512,
            "blake2s256" => Self::Blake2s256,
            "md5" => Self::Md5,
            "sha1" => Self::Sha1,
            "sha224" => Self::Sha224,
            "sha256" => Self::Sha256,
            "sha384" => Self::Sha384,
            "sha512" => Self::Sha512,
            "sha512-224" | "sha512/224" => Self::Sha512_224,
            "sha512-256" | "sha512/256" => Self::Sha512_256,
            "sha3-224" => Self::Sha3_224,
            "sha3-256" => Self::Sha3_256,
            "sha3-384" => Self::Sha3_384,
            "sha3-512" => Self::Sha3_512,
            _ => return None,
        })
    }

    /// Digest output length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake2b512 => Blake2b512::output_size(),
            Self::Blake2s256 => Blake2s256::output_size(),
            Self::Md5 => Md5::output_size(),
            Self::Sha1 => Sha1::output_size(),
            Self::Sha224 => Sha224::output_size(),
            Self::Sha256 => Sha256::output_size(),
            Self::Sha384 => Sha384::output_size(),
            Self::Sha512 => Sha512::output_size(),
            Self::Sha512_224 => Sha512_224::output_size(),
            Self::Sha512_256 => Sha512_256::output_size(),
            Self::Sha3_224 => Sha3_224::output_size(),
            Self::Sha3_256 => Sha3_256::output_size(),
            Self::Sha3_384 => Sha3_384::output_size(),
            Self::Sha3_512 => Sha3_512::output_size(),
        }
    }

    /// Internal block length in bytes.
    pub fn block_len(self) -> usize {
        match self {
            Self::Blake2b512 => Blake2b512::block_size(),
            Self::Blake2s256 => Blake2s256::block_size(),
            Self::Md5 => Md5::block_size(),
            Self::Sha1 => Sha1::block_size(),
            Self::Sha224 => Sha224::block_size(),
            Self::Sha256 => Sha256::block_size(),
            Self::Sha384 => Sha384::block_size(),
            Self::Sha512 => Sha512::block_size(),
            Self::Sha512_224 => Sha512_224::block_size(),
            Self::Sha512_256 => Sha512_256::block_size(),
            Self::Sha3_224 => Sha3_224::block_size(),
            Self::Sha3_256 => Sha3_256::block_size(),
            Self::Sha3_384 => Sha3_384::block_size(),
            Self::Sha3_512 => Sha3_512::block_size(),
        }
    }

    /// Fresh streaming context for this algorithm.
    pub fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            Self::Blake2b512 => Box::new(Blake2b512::new()),
            Self::Blake2s256 => Box::new(Blake2s256::new()),
            Self::Md5 => Box::new(Md5::new()),
            Self::Sha1 => Box::new(Sha1::new()),
            Self::Sha224 => Box::new(Sha224::new()),
            Self::Sha256 => Box::new(Sha256::new()),
            Self::Sha384 => Box::new(Sha384::new()),
            Self::Sha512 => Box::new(Sha512::new()),
            Self::Sha512_224 => Box::new(Sha512_224::new()),
            Self::Sha512_256 => Box::new(Sha512_256::new()),
            Self::Sha3_224 => Box::new(Sha3_224::new()),
            Self::Sha3_256 => Box::new(Sha3_256::new()),
            Self::Sha3_384 => Box::new(Sha3_384::new()),
            Self::Sha3_512 => Box::new(Sha3_512::new()),
        }
    }
}

/// Immutable descriptor of one catalogue entry.
#[derive(Debug, Clone)]
pub struct DigestSpec {
    name: String,
    alias: bool,
    kind: AlgoKind,
    digest_len: usize,
    block_len: usize,
}

impl DigestSpec {
    fn from_kind(name: String, alias: bool, kind: AlgoKind) -> Self {
        Self {
            name,
            alias,
            kind,
            digest_len: kind.digest_len(),
            block_len: kind.block_len(),
        }
    }

    /// Canonical lowercase name this entry was enumerated under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this entry is an alias spelling of an earlier entry.
    /// Aliases are listed but never drive computation.
    pub fn is_alias(&self) -> bool {
        self.alias
    }

    pub fn kind(&self) -> AlgoKind {
        self.kind
    }

    pub fn digest_len(&self) -> usize {
        self.digest_len
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }
}

/// Resolve a single user-supplied algorithm name, lowercasing it first.
/// Pure table lookup; no I/O is performed.
pub fn resolve_spec(name: &str) -> Result<DigestSpec> {
    let normalized = name.to_ascii_lowercase();
    match AlgoKind::resolve(&normalized) {
        Some(kind) => Ok(DigestSpec::from_kind(normalized, false, kind)),
        None => Err(HashmvError::AlgorithmNotFound {
            name: name.to_string(),
        }),
    }
}

/// Ordered catalogue of digest specs.
#[derive(Debug, Clone, Default)]
pub struct DigestList {
    entries: Vec<DigestSpec>,
}

impl DigestList {
    /// Enumerate the provider catalogue.
    ///
    /// Names are normalized to lowercase; overlong names, signature schemes
    /// and protocol-bound digests are rejected; names the provider cannot
    /// resolve are dropped. Duplicates fold: the first spelling of a
    /// canonical algorithm wins, later ones are flagged as aliases.
    pub fn enumerate() -> Self {
        let mut entries: Vec<DigestSpec> = Vec::new();
        for raw in PROVIDER_CATALOG {
            let name = raw.to_ascii_lowercase();
            if name.len() >= MAX_NAME_LEN {
                debug!(name = %raw, "provider name too long, skipped");
                continue;
            }
            if EXCLUDED_FRAGMENTS.iter().any(|f| name.contains(f)) {
                continue;
            }
            let Some(kind) = AlgoKind::resolve(&name) else {
                debug!(name = %raw, "provider name did not resolve, skipped");
                continue;
            };
            let alias = entries.iter().any(|e| e.kind == kind);
            entries.push(DigestSpec::from_kind(name, alias, kind));
        }
        Self { entries }
    }

    /// A list holding exactly the one named algorithm.
    pub fn single(name: &str) -> Result<Self> {
        Ok(Self {
            entries: vec![resolve_spec(name)?],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DigestSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that drive computation: the catalogue with aliases folded out.
    pub fn computation_entries(&self) -> impl Iterator<Item = &DigestSpec> {
        self.entries.iter().filter(|e| !e.alias)
    }

    /// Begin a hashing pass over the non-alias entries.
    ///
    /// Context allocation cannot fail recoverably here; if a pass is
    /// dropped before [`MultiHasher::finish`], every lane is released and
    /// nothing is reported.
    pub fn begin(&self) -> MultiHasher<'_> {
        let lanes = self
            .computation_entries()
            .map(|spec| (spec, spec.kind.hasher()))
            .collect();
        MultiHasher { lanes }
    }
}

/// One finalized digest.
#[derive(Debug, Clone)]
pub struct DigestOutput {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A single-read hashing pass feeding every lane the same byte stream.
pub struct MultiHasher<'a> {
    lanes: Vec<(&'a DigestSpec, Box<dyn DynDigest>)>,
}

impl MultiHasher<'_> {
    /// Feed one chunk to every lane.
    pub fn update(&mut self, bytes: &[u8]) {
        for (_, hasher) in &mut self.lanes {
            hasher.update(bytes);
        }
    }

    /// Finalize every lane, in list order.
    pub fn finish(self) -> Vec<DigestOutput> {
        self.lanes
            .into_iter()
            .map(|(spec, hasher)| DigestOutput {
                name: spec.name.clone(),
                bytes: hasher.finalize().into_vec(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_excludes_signature_and_protocol_names() {
        let list = DigestList::enumerate();
        for fragment in EXCLUDED_FRAGMENTS {
            assert!(
                !list.iter().any(|s| s.name().contains(fragment)),
                "catalogue leaked a '{fragment}' entry"
            );
        }
    }

    #[test]
    fn slash_spellings_fold_onto_hyphen_entries() {
        let list = DigestList::enumerate();
        let canonical = list
            .iter()
            .find(|s| s.name() == "sha512-224")
            .expect("sha512-224 enumerated");
        assert!(!canonical.is_alias());
        let alias = list
            .iter()
            .find(|s| s.name() == "sha512/224")
            .expect("sha512/224 enumerated");
        assert!(alias.is_alias());
        assert_eq!(alias.kind(), canonical.kind());
        // aliases never reach computation
        assert!(list.computation_entries().all(|s| !s.is_alias()));
    }

    #[test]
    fn computation_entries_are_unique_per_algorithm() {
        let list = DigestList::enumerate();
        let kinds: Vec<_> = list.computation_entries().map(DigestSpec::kind).collect();
        let mut seen = Vec::new();
        for kind in &kinds {
            assert!(!seen.contains(kind), "{kind:?} drives computation twice");
            seen.push(*kind);
        }
        assert!(kinds.contains(&AlgoKind::Sha256));
        assert!(kinds.contains(&AlgoKind::Md5));
    }

    #[test]
    fn spec_lengths_match_known_algorithms() {
        let sha256 = resolve_spec("sha256").unwrap();
        assert_eq!(sha256.digest_len(), 32);
        assert_eq!(sha256.block_len(), 64);
        let sha512 = resolve_spec("SHA512").unwrap();
        assert_eq!(sha512.name(), "sha512");
        assert_eq!(sha512.digest_len(), 64);
        assert_eq!(sha512.block_len(), 128);
        let trunc = resolve_spec("sha512/256").unwrap();
        assert_eq!(trunc.digest_len(), 32);
        assert_eq!(trunc.block_len(), 128);
    }

    #[test]
    fn unknown_name_is_reported() {
        assert!(matches!(
            resolve_spec("not-a-hash"),
            Err(HashmvError::AlgorithmNotFound { name }) if name == "not-a-hash"
        ));
    }

    #[test]
    fn single_pass_matches_known_vector() {
        let list = DigestList::single("sha256").unwrap();
        let mut pass = list.begin();
        pass.update(b"abc");
        let outputs = pass.finish();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "sha256");
        assert_eq!(
            hex::encode(&outputs[0].bytes),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chunked_update_equals_one_shot() {
        let list = DigestList::single("sha1").unwrap();
        let mut chunked = list.begin();
        chunked.update(b"hello ");
        chunked.update(b"world");
        let mut oneshot = list.begin();
        oneshot.update(b"hello world");
        assert_eq!(chunked.finish()[0].bytes, oneshot.finish()[0].bytes);
    }

    #[test]
    fn every_lane_sees_the_same_stream() {
        let list = DigestList::enumerate();
        let mut pass = list.begin();
        pass.update(b"the same bytes for everyone");
        let outputs = pass.finish();
        assert_eq!(outputs.len(), list.computation_entries().count());
        let md5 = outputs.iter().find(|o| o.name == "md5").unwrap();
        assert_eq!(md5.bytes.len(), 16);
        let sha512 = outputs.iter().find(|o| o.name == "sha512").unwrap();
        assert_eq!(sha512.bytes.len(), 64);
    }
}
