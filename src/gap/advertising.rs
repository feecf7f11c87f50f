//! Advertising payload builder
//!
//! Builds the legacy advertising data as a sequence of
//! `[length][AD type][data...]` records, where `length` counts the type byte
//! plus the data.

use heapless::Vec;

use crate::config::advertising::{
    AD_TYPE_COMPLETE_LOCAL_NAME, AD_TYPE_FLAGS, AD_TYPE_UUID128_INCOMPLETE,
    FLAGS_LE_ONLY_GENERAL_DISC, MAX_PAYLOAD,
};

/// Advertising data did not fit in a legacy payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadTooLong;

/// Advertising data, at most 31 bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisingData {
    buf: Vec<u8, MAX_PAYLOAD>,
}

impl AdvertisingData {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Payload for the transport: name, discovery flags, console service.
    ///
    /// Only the console service is listed; the raw service shows up through
    /// service discovery once connected.
    pub fn for_device(name: &str, service_uuid: u128) -> Result<Self, PayloadTooLong> {
        let mut adv = Self::new();
        adv.add_complete_local_name(name)?;
        adv.add_flags(FLAGS_LE_ONLY_GENERAL_DISC)?;
        adv.add_incomplete_uuid128(service_uuid)?;
        Ok(adv)
    }

    pub fn add_complete_local_name(&mut self, name: &str) -> Result<(), PayloadTooLong> {
        self.add_record(AD_TYPE_COMPLETE_LOCAL_NAME, name.as_bytes())
    }

    pub fn add_flags(&mut self, flags: u8) -> Result<(), PayloadTooLong> {
        self.add_record(AD_TYPE_FLAGS, &[flags])
    }

    /// 128-bit service UUID, marked as a partial list
    pub fn add_incomplete_uuid128(&mut self, uuid: u128) -> Result<(), PayloadTooLong> {
        self.add_record(AD_TYPE_UUID128_INCOMPLETE, &uuid.to_le_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn add_record(&mut self, ad_type: u8, data: &[u8]) -> Result<(), PayloadTooLong> {
        if self.buf.len() + 2 + data.len() > MAX_PAYLOAD {
            return Err(PayloadTooLong);
        }
        // Capacity checked above, so these cannot fail
        let _ = self.buf.push(1 + data.len() as u8);
        let _ = self.buf.push(ad_type);
        let _ = self.buf.extend_from_slice(data);
        Ok(())
    }
}
