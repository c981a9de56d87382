use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};

use crate::{
    error::{ScwsError, ScwsResult},
    manifest::InitializationVector,
};

/// AES-128 key material of a stream.
///
/// Every segment of a title is encrypted with the same key and the same IV.
#[derive(Clone)]
pub struct SegmentKey {
    key: [u8; 16],
    iv: [u8; 16],
}

impl SegmentKey {
    pub fn new(key: &[u8], iv: InitializationVector) -> ScwsResult<Self> {
        Ok(Self {
            key: key
                .try_into()
                .map_err(|_| ScwsError::InvalidKey(key.len()))?,
            iv: iv.0,
        })
    }

    pub fn to_decryptor(&self) -> SegmentDecryptor {
        SegmentDecryptor(cbc::Decryptor::<aes::Aes128>::new(
            &self.key.into(),
            &self.iv.into(),
        ))
    }

    pub fn decrypt(&self, data: &[u8]) -> ScwsResult<Vec<u8>> {
        self.to_decryptor().decrypt(data)
    }
}

pub struct SegmentDecryptor(cbc::Decryptor<aes::Aes128>);

impl SegmentDecryptor {
    pub fn decrypt(self, data: &[u8]) -> ScwsResult<Vec<u8>> {
        Ok(self.0.decrypt_padded_vec_mut::<Pkcs7>(data)?)
    }
}
