//! Versioned persistence of the configuration record.
//!
//! The 1024-byte store is split into two slots. Each save goes to the slot
//! that is *not* currently active, so a save interrupted by power loss never
//! damages the last good record.
//!
//! # Slot layout
//!
//! ```text
//! offset  size  field
//! 0       1     marker (FORMAT_VERSION)
//! 1       2     sequence, little endian, wraps
//! 3       2     payload length, little endian
//! 5       n     payload
//! 5+n     4     CRC-32/ISO-HDLC over bytes 0..5+n
//! ```
//!
//! The marker byte is written last. A slot is valid only when the marker
//! matches, the CRC matches and the payload decodes within every field domain.
//! On load the valid slot with the newest sequence wins.
//!
//! # Payload
//!
//! Fields are encoded one after another in record order: integers little
//! endian, the four booleans packed into one flags byte, the IP address as its
//! four octets, the policy as a one-byte tag and each text as a length byte
//! followed by its UTF-8 bytes.

use crc::{Crc, CRC_32_ISO_HDLC};
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{
    defaults, Channel, ConfigurationRecord, PublishingPolicy, Text, HOST_NAME_LEN,
    NTP_POOL_LEN, PASSWORD_LEN, SSID_LEN, STATION_SSID_LEN, URL_LEN, USERNAME_LEN,
};
use crate::store::{NonVolatileStore, StoreError, ERASED_BYTE, STORE_CAPACITY};

/// Format version marker. Distinct from the erased state and from zeroed media.
pub const FORMAT_VERSION: u8 = 0x10;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

const HEADER_SIZE: usize = 5;
const CRC_SIZE: usize = 4;

const FLAG_ACCESS_POINT_MODE: u8 = 0b0001;
const FLAG_STATION_MODE: u8 = 0b0010;
const FLAG_REQUIRE_AUTHENTICATION: u8 = 0b0100;
const FLAG_USE_NTP: u8 = 0b1000;

const POLICY_PUSH: u8 = 0;
const POLICY_POLL: u8 = 1;

/// Length byte plus content.
const fn text_width(bound: usize) -> usize {
    1 + bound
}

/// Maximum encoded payload width.
pub const MAX_PAYLOAD_SIZE: usize = 2 // server port
    + 1 // flags
    + 4 // access point IP
    + 1 // channel
    + 4 // sample interval
    + 1 // policy
    + 4 // NTP offset
    + text_width(SSID_LEN)
    + text_width(PASSWORD_LEN)
    + text_width(STATION_SSID_LEN)
    + text_width(PASSWORD_LEN)
    + text_width(USERNAME_LEN)
    + text_width(PASSWORD_LEN)
    + text_width(URL_LEN)
    + text_width(USERNAME_LEN)
    + text_width(PASSWORD_LEN)
    + text_width(NTP_POOL_LEN)
    + text_width(HOST_NAME_LEN);

/// Size of one slot.
pub const SLOT_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Number of slots.
pub const SLOT_COUNT: usize = 2;

const _: () = assert!(SLOT_COUNT * SLOT_SIZE <= STORE_CAPACITY);
const _: () = assert!(MAX_PAYLOAD_SIZE <= u16::MAX as usize);

// ============================================================================
// Errors and outcomes
// ============================================================================

/// Errors returned by [`PersistenceStore::save`].
#[derive(Debug, Error)]
pub enum PersistError {
    /// The store rejected a write. The durable copy still holds the previous record.
    #[error("failed to write configuration to store: {0}")]
    StoreWrite(#[source] StoreError),

    /// The record violates a field domain and would not load back.
    #[error("configuration record is invalid: {0}")]
    InvalidRecord(&'static str),

    /// The store is smaller than the slot layout requires.
    #[error("store capacity {capacity} is smaller than the required {required}")]
    CapacityTooSmall { capacity: usize, required: usize },
}

/// Reasons a payload fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated")]
    Truncated,
    #[error("slot checksum mismatch")]
    ChecksumMismatch,
    #[error("text field {0} is not valid bounded UTF-8")]
    InvalidText(&'static str),
    #[error("channel index {0} out of range")]
    InvalidChannel(u8),
    #[error("unknown publishing policy tag {0}")]
    InvalidPolicy(u8),
    #[error("sample interval is zero")]
    ZeroInterval,
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// Why `load()` fell back to factory defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryResetReason {
    /// Neither slot was ever written.
    Blank,
    /// A slot marker does not match the current format (foreign or older media).
    VersionMismatch { found: u8 },
    /// Markers matched but no slot passed its checksum (torn write).
    Corrupt,
}

/// Where the loaded record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// A valid stored slot.
    Stored { slot: usize, sequence: u16 },
    /// Factory defaults. `repaired` is false when the write-through save failed.
    FactoryReset {
        reason: FactoryResetReason,
        repaired: bool,
    },
}

/// Result of [`PersistenceStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub record: ConfigurationRecord,
    pub source: LoadSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSlot {
    slot: usize,
    sequence: u16,
}

enum SlotState {
    Valid(u16, ConfigurationRecord),
    Erased,
    Foreign(u8),
    Torn,
}

// ============================================================================
// Persistence store
// ============================================================================

/// Loads and saves the configuration record on a [`NonVolatileStore`].
pub struct PersistenceStore<S> {
    store: S,
    active: Option<ActiveSlot>,
}

impl<S: NonVolatileStore> PersistenceStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            active: None,
        }
    }

    /// Load the newest valid record.
    ///
    /// When no slot holds a valid record the factory defaults are returned and
    /// immediately saved, so the next boot finds a valid store.
    pub fn load(&mut self) -> Loaded {
        let states: Vec<SlotState> = (0..SLOT_COUNT).map(|slot| self.read_slot(slot)).collect();

        let mut best: Option<(usize, u16, ConfigurationRecord)> = None;
        for (slot, state) in states.iter().enumerate() {
            match state {
                SlotState::Valid(sequence, record) => {
                    let newer = match &best {
                        Some((_, best_seq, _)) => is_newer(*sequence, *best_seq),
                        None => true,
                    };
                    if newer {
                        best = Some((slot, *sequence, record.clone()));
                    }
                }
                SlotState::Torn => {
                    warn!(slot, "configuration slot failed its checksum (torn write)");
                }
                SlotState::Erased | SlotState::Foreign(_) => {}
            }
        }

        if let Some((slot, sequence, record)) = best {
            info!(slot, sequence, "loaded configuration from store");
            self.active = Some(ActiveSlot { slot, sequence });
            return Loaded {
                record,
                source: LoadSource::Stored { slot, sequence },
            };
        }

        let reason = if states.iter().any(|s| matches!(s, SlotState::Torn)) {
            FactoryResetReason::Corrupt
        } else if let Some(found) = states.iter().find_map(|s| match s {
            SlotState::Foreign(found) => Some(*found),
            _ => None,
        }) {
            FactoryResetReason::VersionMismatch { found }
        } else {
            FactoryResetReason::Blank
        };

        info!(?reason, "no valid configuration in store, restoring factory defaults");
        self.active = None;
        let record = defaults();
        let repaired = match self.save(&record) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to persist factory defaults: {}", e);
                false
            }
        };

        Loaded {
            record,
            source: LoadSource::FactoryReset { reason, repaired },
        }
    }

    /// Save `record` to the inactive slot.
    ///
    /// The marker byte is written last. On error the previously active slot is
    /// left untouched and remains the one `load()` returns.
    pub fn save(&mut self, record: &ConfigurationRecord) -> Result<(), PersistError> {
        let capacity = self.store.capacity();
        if capacity < SLOT_COUNT * SLOT_SIZE {
            return Err(PersistError::CapacityTooSmall {
                capacity,
                required: SLOT_COUNT * SLOT_SIZE,
            });
        }
        if record.sensor_sample_interval == 0 {
            return Err(PersistError::InvalidRecord("sample interval must be greater than zero"));
        }

        let (slot, sequence) = match self.active {
            Some(active) => ((active.slot + 1) % SLOT_COUNT, active.sequence.wrapping_add(1)),
            None => (0, 0),
        };

        let image = encode_slot(sequence, record);
        let base = slot * SLOT_SIZE;

        self.store
            .write(base + 1, &image[1..])
            .map_err(PersistError::StoreWrite)?;
        self.store
            .write(base, &image[..1])
            .map_err(PersistError::StoreWrite)?;
        self.store.commit().map_err(PersistError::StoreWrite)?;

        debug!(slot, sequence, bytes = image.len(), "configuration saved");
        self.active = Some(ActiveSlot { slot, sequence });
        Ok(())
    }

    /// Marker byte of the active slot, if any slot is active.
    pub fn sentinel(&self) -> Option<u8> {
        let active = self.active?;
        let mut marker = [0u8; 1];
        self.store.read(active.slot * SLOT_SIZE, &mut marker).ok()?;
        Some(marker[0])
    }

    /// Index and sequence of the active slot.
    pub fn active_slot(&self) -> Option<(usize, u16)> {
        self.active.map(|a| (a.slot, a.sequence))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read_slot(&self, slot: usize) -> SlotState {
        let mut image = vec![0u8; SLOT_SIZE];
        if let Err(e) = self.store.read(slot * SLOT_SIZE, &mut image) {
            warn!(slot, "failed to read configuration slot: {}", e);
            return SlotState::Torn;
        }

        match image[0] {
            FORMAT_VERSION => {}
            ERASED_BYTE => return SlotState::Erased,
            found => return SlotState::Foreign(found),
        }

        match decode_slot(&image) {
            Ok((sequence, record)) => SlotState::Valid(sequence, record),
            Err(e) => {
                debug!(slot, "slot rejected: {}", e);
                SlotState::Torn
            }
        }
    }
}

/// Wrapping sequence comparison: true if `a` was written after `b`.
fn is_newer(a: u16, b: u16) -> bool {
    (a.wrapping_sub(b) as i16) > 0
}

// ============================================================================
// Slot codec
// ============================================================================

fn encode_slot(sequence: u16, record: &ConfigurationRecord) -> Vec<u8> {
    let payload = encode_record(record);

    let mut image = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    image.push(FORMAT_VERSION);
    image.extend_from_slice(&sequence.to_le_bytes());
    image.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    image.extend_from_slice(&payload);
    let crc = CRC32.checksum(&image);
    image.extend_from_slice(&crc.to_le_bytes());
    image
}

/// Decode a full slot image. The marker is assumed to be checked already.
fn decode_slot(image: &[u8]) -> Result<(u16, ConfigurationRecord), DecodeError> {
    if image.len() < HEADER_SIZE + CRC_SIZE {
        return Err(DecodeError::Truncated);
    }
    let sequence = u16::from_le_bytes([image[1], image[2]]);
    let length = u16::from_le_bytes([image[3], image[4]]) as usize;
    if length > MAX_PAYLOAD_SIZE || HEADER_SIZE + length + CRC_SIZE > image.len() {
        return Err(DecodeError::Truncated);
    }

    let body_end = HEADER_SIZE + length;
    let stored_crc = u32::from_le_bytes([
        image[body_end],
        image[body_end + 1],
        image[body_end + 2],
        image[body_end + 3],
    ]);
    if CRC32.checksum(&image[..body_end]) != stored_crc {
        return Err(DecodeError::ChecksumMismatch);
    }

    let record = decode_record(&image[HEADER_SIZE..body_end])?;
    Ok((sequence, record))
}

/// Encode a record payload.
pub fn encode_record(record: &ConfigurationRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_PAYLOAD_SIZE);

    let mut flags = 0u8;
    if record.access_point_mode {
        flags |= FLAG_ACCESS_POINT_MODE;
    }
    if record.station_mode {
        flags |= FLAG_STATION_MODE;
    }
    if record.station_require_authentication {
        flags |= FLAG_REQUIRE_AUTHENTICATION;
    }
    if record.use_ntp {
        flags |= FLAG_USE_NTP;
    }

    out.extend_from_slice(&record.server_port.to_le_bytes());
    out.push(flags);
    out.extend_from_slice(&record.access_point_ip.octets());
    out.push(record.access_point_channel.index());
    out.extend_from_slice(&record.sensor_sample_interval.to_le_bytes());
    out.push(match record.publishing_policy {
        PublishingPolicy::Push => POLICY_PUSH,
        PublishingPolicy::Poll => POLICY_POLL,
    });
    out.extend_from_slice(&record.ntp_offset.to_le_bytes());

    for text in [
        record.access_point_ssid.as_str(),
        record.access_point_password.as_str(),
        record.station_ssid.as_str(),
        record.station_access_point_password.as_str(),
        record.station_username.as_str(),
        record.station_password.as_str(),
        record.publishing_url.as_str(),
        record.publishing_username.as_str(),
        record.publishing_password.as_str(),
        record.ntp_pool_url.as_str(),
        record.host_name.as_str(),
    ] {
        out.push(text.len() as u8);
        out.extend_from_slice(text.as_bytes());
    }

    out
}

/// Decode a record payload, validating every field domain.
pub fn decode_record(payload: &[u8]) -> Result<ConfigurationRecord, DecodeError> {
    let mut r = Reader { buf: payload, pos: 0 };

    let server_port = u16::from_le_bytes(r.array()?);
    let flags = r.u8()?;
    let access_point_ip = Ipv4Addr::from(r.array::<4>()?);
    let channel_index = r.u8()?;
    let access_point_channel =
        Channel::new(channel_index).ok_or(DecodeError::InvalidChannel(channel_index))?;
    let sensor_sample_interval = u32::from_le_bytes(r.array()?);
    if sensor_sample_interval == 0 {
        return Err(DecodeError::ZeroInterval);
    }
    let publishing_policy = match r.u8()? {
        POLICY_PUSH => PublishingPolicy::Push,
        POLICY_POLL => PublishingPolicy::Poll,
        tag => return Err(DecodeError::InvalidPolicy(tag)),
    };
    let ntp_offset = i32::from_le_bytes(r.array()?);

    let record = ConfigurationRecord {
        server_port,
        access_point_ssid: r.text("accessPointSSID")?,
        access_point_ip,
        access_point_mode: flags & FLAG_ACCESS_POINT_MODE != 0,
        access_point_password: r.text("accessPointPassword")?,
        access_point_channel,
        station_mode: flags & FLAG_STATION_MODE != 0,
        station_ssid: r.text("stationSSID")?,
        station_access_point_password: r.text("stationAccessPointPassword")?,
        station_require_authentication: flags & FLAG_REQUIRE_AUTHENTICATION != 0,
        station_username: r.text("stationUsername")?,
        station_password: r.text("stationPassword")?,
        sensor_sample_interval,
        publishing_policy,
        publishing_url: r.text("publishingURL")?,
        publishing_username: r.text("publishingUsername")?,
        publishing_password: r.text("publishingPassword")?,
        use_ntp: flags & FLAG_USE_NTP != 0,
        ntp_pool_url: r.text("NTPPoolURL")?,
        ntp_offset,
        host_name: r.text("hostName")?,
    };

    let remaining = payload.len() - r.pos;
    if remaining != 0 {
        return Err(DecodeError::TrailingBytes(remaining));
    }
    Ok(record)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        let bytes = self.buf.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn text<const N: usize>(&mut self, field: &'static str) -> Result<Text<N>, DecodeError> {
        let len = self.u8()? as usize;
        if len > N {
            return Err(DecodeError::InvalidText(field));
        }
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidText(field))?;
        let mut text = Text::<N>::new();
        text.push_str(s).map_err(|_| DecodeError::InvalidText(field))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bounded;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn custom_record() -> ConfigurationRecord {
        ConfigurationRecord {
            server_port: 8080,
            access_point_ssid: bounded("airnode-ap"),
            access_point_ip: Ipv4Addr::new(10, 0, 0, 1),
            access_point_mode: false,
            access_point_channel: Channel::new(13).unwrap(),
            station_mode: true,
            station_ssid: bounded("HomeNetwork \"5G\""),
            station_access_point_password: bounded("s3cret"),
            station_require_authentication: false,
            publishing_policy: PublishingPolicy::Push,
            publishing_url: bounded("http://collector.local/api/measurements"),
            publishing_username: bounded("node"),
            publishing_password: bounded("pa55"),
            ntp_offset: -7200,
            host_name: bounded("greenhouse"),
            sensor_sample_interval: 300,
            ..defaults()
        }
    }

    fn max_record() -> ConfigurationRecord {
        ConfigurationRecord {
            access_point_ssid: bounded(&"a".repeat(64)),
            access_point_password: bounded(&"b".repeat(64)),
            station_ssid: bounded(&"c".repeat(64)),
            station_access_point_password: bounded(&"d".repeat(64)),
            station_username: bounded(&"e".repeat(64)),
            station_password: bounded(&"f".repeat(64)),
            publishing_url: bounded(&"g".repeat(128)),
            publishing_username: bounded(&"h".repeat(64)),
            publishing_password: bounded(&"i".repeat(64)),
            ntp_pool_url: bounded(&"j".repeat(64)),
            host_name: bounded(&"k".repeat(64)),
            ..custom_record()
        }
    }

    #[test]
    fn test_layout_fits_store() {
        assert_eq!(encode_record(&max_record()).len(), MAX_PAYLOAD_SIZE);
        assert!(SLOT_COUNT * SLOT_SIZE <= STORE_CAPACITY);
    }

    #[test]
    fn test_payload_round_trip() {
        for record in [defaults(), custom_record(), max_record()] {
            let payload = encode_record(&record);
            assert_eq!(decode_record(&payload).unwrap(), record);
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.save(&custom_record()).unwrap();

        let mut reopened = PersistenceStore::new(persist.into_inner());
        let loaded = reopened.load();
        assert_eq!(loaded.record, custom_record());
        assert_eq!(loaded.source, LoadSource::Stored { slot: 0, sequence: 0 });
    }

    #[test]
    fn test_blank_store_restores_defaults() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        let loaded = persist.load();

        assert_eq!(loaded.record, defaults());
        assert_eq!(
            loaded.source,
            LoadSource::FactoryReset {
                reason: FactoryResetReason::Blank,
                repaired: true
            }
        );
        assert_eq!(persist.sentinel(), Some(FORMAT_VERSION));

        // Second boot reads the repaired store
        let mut reopened = PersistenceStore::new(persist.into_inner());
        assert!(matches!(reopened.load().source, LoadSource::Stored { .. }));
    }

    #[test]
    fn test_foreign_store_restores_defaults() {
        let mut image = vec![0u8; STORE_CAPACITY];
        image[0] = 15; // marker written by an older single-slot firmware
        let mut persist = PersistenceStore::new(MemoryStore::from_bytes(image));

        let loaded = persist.load();
        assert_eq!(loaded.record, defaults());
        assert!(matches!(
            loaded.source,
            LoadSource::FactoryReset {
                reason: FactoryResetReason::VersionMismatch { .. },
                ..
            }
        ));
        assert_eq!(persist.sentinel(), Some(FORMAT_VERSION));
    }

    #[test]
    fn test_saves_alternate_slots() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.load();
        assert_eq!(persist.active_slot(), Some((0, 0)));

        persist.save(&custom_record()).unwrap();
        assert_eq!(persist.active_slot(), Some((1, 1)));

        let mut newer = custom_record();
        newer.server_port = 9090;
        persist.save(&newer).unwrap();
        assert_eq!(persist.active_slot(), Some((0, 2)));

        let mut reopened = PersistenceStore::new(persist.into_inner());
        assert_eq!(reopened.load().record.server_port, 9090);
    }

    #[test]
    fn test_sequence_wraps() {
        assert!(is_newer(1, 0));
        assert!(is_newer(0, u16::MAX));
        assert!(!is_newer(u16::MAX, 0));
        assert!(!is_newer(5, 5));
    }

    #[test]
    fn test_torn_write_recovers_previous_record() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.save(&custom_record()).unwrap();

        let mut edited = custom_record();
        edited.host_name = bounded("edited");

        // Power fails part way through the next slot image
        persist.store_mut().simulate_power_loss_after(40);
        assert!(matches!(
            persist.save(&edited),
            Err(PersistError::StoreWrite(_))
        ));

        let mut store = persist.into_inner();
        store.restore_power();
        let mut reopened = PersistenceStore::new(store);
        let loaded = reopened.load();

        // The interrupted save is lost; the previous record survives intact
        assert_eq!(loaded.record, custom_record());
        assert_eq!(loaded.source, LoadSource::Stored { slot: 0, sequence: 0 });
    }

    #[test]
    fn test_torn_overwrite_of_stale_slot_is_detected() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.load(); // defaults in slot 0
        persist.save(&custom_record()).unwrap(); // slot 1

        // The next save targets slot 0, which still carries a valid marker
        let mut edited = custom_record();
        edited.server_port = 1234;
        persist.store_mut().simulate_power_loss_after(20);
        assert!(persist.save(&edited).is_err());

        let mut store = persist.into_inner();
        store.restore_power();
        assert_eq!(store.as_bytes()[0], FORMAT_VERSION);

        let mut reopened = PersistenceStore::new(store);
        let loaded = reopened.load();
        assert_eq!(loaded.record, custom_record());
        assert_eq!(loaded.source, LoadSource::Stored { slot: 1, sequence: 1 });
    }

    #[test]
    fn test_all_slots_corrupt() {
        let mut store = MemoryStore::new();
        store.poke(0, &[FORMAT_VERSION, 0, 0, 3, 0, 1, 2, 3]);
        let mut persist = PersistenceStore::new(store);

        let loaded = persist.load();
        assert_eq!(loaded.record, defaults());
        assert_eq!(
            loaded.source,
            LoadSource::FactoryReset {
                reason: FactoryResetReason::Corrupt,
                repaired: true
            }
        );
    }

    #[test]
    fn test_flipped_bit_invalidates_slot() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.save(&custom_record()).unwrap();

        let mut store = persist.into_inner();
        let byte = store.as_bytes()[HEADER_SIZE + 3];
        store.poke(HEADER_SIZE + 3, &[byte ^ 0x01]);

        let mut reopened = PersistenceStore::new(store);
        let loaded = reopened.load();
        assert_eq!(loaded.record, defaults());
    }

    #[test]
    fn test_write_error_keeps_active_slot() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        persist.save(&custom_record()).unwrap();

        persist.store_mut().reject_writes(true);
        let err = persist.save(&defaults()).unwrap_err();
        assert!(matches!(err, PersistError::StoreWrite(StoreError::Rejected { .. })));
        assert_eq!(persist.active_slot(), Some((0, 0)));

        persist.store_mut().reject_writes(false);
        let mut reopened = PersistenceStore::new(persist.into_inner());
        assert_eq!(reopened.load().record, custom_record());
    }

    #[test]
    fn test_failed_repair_still_returns_defaults() {
        let mut store = MemoryStore::new();
        store.reject_writes(true);
        let mut persist = PersistenceStore::new(store);

        let loaded = persist.load();
        assert_eq!(loaded.record, defaults());
        assert_eq!(
            loaded.source,
            LoadSource::FactoryReset {
                reason: FactoryResetReason::Blank,
                repaired: false
            }
        );
        assert_eq!(persist.sentinel(), None);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut persist = PersistenceStore::new(MemoryStore::new());
        let record = ConfigurationRecord {
            sensor_sample_interval: 0,
            ..defaults()
        };
        assert!(matches!(
            persist.save(&record),
            Err(PersistError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_small_store_rejected() {
        let mut persist = PersistenceStore::new(MemoryStore::with_capacity(256));
        assert!(matches!(
            persist.save(&defaults()),
            Err(PersistError::CapacityTooSmall { capacity: 256, .. })
        ));
    }
}
