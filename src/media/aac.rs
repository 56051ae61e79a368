//! AAC codec configuration (AudioSpecificConfig)
//!
//! RTMP transports AAC audio in raw format (without ADTS headers); decoders
//! instead receive a one-time AudioSpecificConfig record carried in the AAC
//! sequence header packet.
//!
//! AudioSpecificConfig (bit-packed):
//! ```text
//! audioObjectType (5) | samplingFrequencyIndex (4) | channelConfiguration (4)
//! | frameLengthFlag (1) | dependsOnCoreCoder (1) | extensionFlag (1)
//! ```
//! When samplingFrequencyIndex == 0xF, an explicit 24-bit frequency follows
//! the index.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};

/// AAC profile (audio object type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacProfile {
    /// AAC Main
    Main = 1,
    /// AAC LC (Low Complexity) - most common
    Lc = 2,
    /// AAC SSR (Scalable Sample Rate)
    Ssr = 3,
    /// AAC LTP (Long Term Prediction)
    Ltp = 4,
    /// SBR (Spectral Band Replication) - HE-AAC
    Sbr = 5,
}

impl AacProfile {
    pub fn from_object_type(ot: u8) -> Option<Self> {
        match ot {
            1 => Some(AacProfile::Main),
            2 => Some(AacProfile::Lc),
            3 => Some(AacProfile::Ssr),
            4 => Some(AacProfile::Ltp),
            5 => Some(AacProfile::Sbr),
            _ => None,
        }
    }
}

/// AudioSpecificConfig: the AAC sequence-header payload
///
/// Built from the upstream encoder's format metadata and serialized with
/// [`AudioSpecificConfig::bytes`]; the parse direction is kept for validating
/// records in tests and for receivers.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSpecificConfig {
    /// Audio object type (profile)
    pub audio_object_type: u8,
    /// Sampling frequency index
    pub sampling_frequency_index: u8,
    /// Sampling frequency in Hz
    pub sampling_frequency: u32,
    /// Channel configuration (1=mono, 2=stereo, etc.)
    pub channel_configuration: u8,
}

impl AudioSpecificConfig {
    /// Standard sampling frequencies by index
    const SAMPLING_FREQUENCIES: [u32; 13] = [
        96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
    ];

    /// Create a config from format metadata.
    ///
    /// Returns `InvalidAacConfig` when the sample rate has no standard index
    /// or the channel count is out of range.
    pub fn new(profile: AacProfile, sample_rate: u32, channels: u8) -> Result<Self> {
        let index = Self::SAMPLING_FREQUENCIES
            .iter()
            .position(|&f| f == sample_rate)
            .ok_or(MediaError::InvalidAacConfig)?;
        if channels == 0 || channels > 8 {
            return Err(MediaError::InvalidAacConfig.into());
        }
        Ok(Self {
            audio_object_type: profile as u8,
            sampling_frequency_index: index as u8,
            sampling_frequency: sample_rate,
            channel_configuration: channels,
        })
    }

    /// Serialize to the bit-packed AudioSpecificConfig record.
    pub fn bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(self.audio_object_type << 3 | self.sampling_frequency_index >> 1);
        buf.put_u8((self.sampling_frequency_index & 0x01) << 7 | self.channel_configuration << 3);
        buf.freeze()
    }

    /// Parse from an AAC sequence header payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(MediaError::InvalidAacConfig.into());
        }

        let b0 = data[0];
        let b1 = data[1];

        let audio_object_type = (b0 >> 3) & 0x1F;
        let sampling_frequency_index = ((b0 & 0x07) << 1) | ((b1 >> 7) & 0x01);

        let sampling_frequency = if (sampling_frequency_index as usize)
            < Self::SAMPLING_FREQUENCIES.len()
        {
            Self::SAMPLING_FREQUENCIES[sampling_frequency_index as usize]
        } else {
            return Err(MediaError::InvalidAacConfig.into());
        };

        let channel_configuration = (b1 >> 3) & 0x0F;

        Ok(AudioSpecificConfig {
            audio_object_type,
            sampling_frequency_index,
            sampling_frequency,
            channel_configuration,
        })
    }

    /// Get the profile
    pub fn profile(&self) -> Option<AacProfile> {
        AacProfile::from_object_type(self.audio_object_type)
    }

    /// Get channel count
    pub fn channels(&self) -> u8 {
        match self.channel_configuration {
            7 => 8, // 7.1
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_lc_44100_stereo() {
        let config = AudioSpecificConfig::new(AacProfile::Lc, 44100, 2).unwrap();
        // AAC-LC, 44100 Hz (index 4), stereo: the canonical 0x12 0x10 record
        assert_eq!(&config.bytes()[..], &[0x12, 0x10]);
    }

    #[test]
    fn test_build_parse_roundtrip() {
        let config = AudioSpecificConfig::new(AacProfile::Lc, 48000, 1).unwrap();
        let parsed = AudioSpecificConfig::parse(&config.bytes()).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.sampling_frequency, 48000);
        assert_eq!(parsed.channels(), 1);
        assert_eq!(parsed.profile(), Some(AacProfile::Lc));
    }

    #[test]
    fn test_parse_canonical_record() {
        let config = AudioSpecificConfig::parse(&[0x12, 0x10]).unwrap();
        assert_eq!(config.audio_object_type, 2);
        assert_eq!(config.sampling_frequency_index, 4);
        assert_eq!(config.sampling_frequency, 44100);
        assert_eq!(config.channel_configuration, 2);
    }

    #[test]
    fn test_rejects_nonstandard_rate() {
        assert!(AudioSpecificConfig::new(AacProfile::Lc, 44000, 2).is_err());
        assert!(AudioSpecificConfig::new(AacProfile::Lc, 44100, 0).is_err());
    }

    #[test]
    fn test_parse_short_input() {
        assert!(AudioSpecificConfig::parse(&[0x12]).is_err());
    }
}
