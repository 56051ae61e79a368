//! H.264/AVC codec configuration
//!
//! RTMP transports H.264 in AVCC format (length-prefixed NAL units) and
//! announces the decoder parameters out-of-band in an
//! AVCDecoderConfigurationRecord carried by the AVC sequence header packet.
//!
//! AVCDecoderConfigurationRecord:
//! ```text
//! configurationVersion (1) | AVCProfileIndication (1) | profile_compatibility (1)
//! | AVCLevelIndication (1) | lengthSizeMinusOne (1, lower 2 bits)
//! | numOfSPS (1, lower 5 bits) | { spsLength (2) | spsNALUnit }*
//! | numOfPPS (1) | { ppsLength (2) | ppsNALUnit }*
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};

/// AVC decoder configuration: profile/level plus SPS/PPS parameter sets
#[derive(Debug, Clone, PartialEq)]
pub struct AvcConfig {
    /// AVC profile (66=Baseline, 77=Main, 100=High, etc.)
    pub profile: u8,
    /// Profile compatibility flags
    pub compatibility: u8,
    /// AVC level (e.g., 31 = 3.1)
    pub level: u8,
    /// NALU length size minus 1 (usually 3, meaning 4-byte lengths)
    pub nalu_length_size: u8,
    /// Sequence Parameter Sets
    pub sps: Vec<Bytes>,
    /// Picture Parameter Sets
    pub pps: Vec<Bytes>,
}

impl AvcConfig {
    /// Build a config from encoder-supplied parameter sets.
    ///
    /// Profile, compatibility and level are read from the first SPS
    /// (bytes 1..4 of the NAL unit, after the header byte).
    pub fn from_parameter_sets(sps: Vec<Bytes>, pps: Vec<Bytes>) -> Result<Self> {
        let first_sps = sps.first().ok_or(MediaError::InvalidAvcConfig)?;
        if first_sps.len() < 4 || pps.is_empty() {
            return Err(MediaError::InvalidAvcConfig.into());
        }
        if sps.len() > 0x1F || pps.len() > 0xFF {
            return Err(MediaError::InvalidAvcConfig.into());
        }

        Ok(AvcConfig {
            profile: first_sps[1],
            compatibility: first_sps[2],
            level: first_sps[3],
            nalu_length_size: 4,
            sps,
            pps,
        })
    }

    /// Serialize to an AVCDecoderConfigurationRecord.
    pub fn config_record(&self) -> Bytes {
        let size = 7
            + self.sps.iter().map(|s| 2 + s.len()).sum::<usize>()
            + self.pps.iter().map(|p| 2 + p.len()).sum::<usize>();
        let mut buf = BytesMut::with_capacity(size);

        buf.put_u8(1); // configurationVersion
        buf.put_u8(self.profile);
        buf.put_u8(self.compatibility);
        buf.put_u8(self.level);
        buf.put_u8(0xFC | (self.nalu_length_size - 1));
        buf.put_u8(0xE0 | self.sps.len() as u8);
        for sps in &self.sps {
            buf.put_u16(sps.len() as u16);
            buf.put_slice(sps);
        }
        buf.put_u8(self.pps.len() as u8);
        for pps in &self.pps {
            buf.put_u16(pps.len() as u16);
            buf.put_slice(pps);
        }

        buf.freeze()
    }

    /// Parse from an AVCDecoderConfigurationRecord.
    pub fn parse(mut data: Bytes) -> Result<Self> {
        if data.len() < 7 {
            return Err(MediaError::InvalidAvcConfig.into());
        }

        let version = data.get_u8();
        if version != 1 {
            return Err(MediaError::InvalidAvcConfig.into());
        }

        let profile = data.get_u8();
        let compatibility = data.get_u8();
        let level = data.get_u8();
        let nalu_length_size = (data.get_u8() & 0x03) + 1;

        let num_sps = (data.get_u8() & 0x1F) as usize;
        let mut sps = Vec::with_capacity(num_sps);
        for _ in 0..num_sps {
            if data.len() < 2 {
                return Err(MediaError::InvalidAvcConfig.into());
            }
            let sps_len = data.get_u16() as usize;
            if data.len() < sps_len {
                return Err(MediaError::InvalidAvcConfig.into());
            }
            sps.push(data.copy_to_bytes(sps_len));
        }

        if data.is_empty() {
            return Err(MediaError::InvalidAvcConfig.into());
        }
        let num_pps = data.get_u8() as usize;
        let mut pps = Vec::with_capacity(num_pps);
        for _ in 0..num_pps {
            if data.len() < 2 {
                return Err(MediaError::InvalidAvcConfig.into());
            }
            let pps_len = data.get_u16() as usize;
            if data.len() < pps_len {
                return Err(MediaError::InvalidAvcConfig.into());
            }
            pps.push(data.copy_to_bytes(pps_len));
        }

        Ok(AvcConfig {
            profile,
            compatibility,
            level,
            nalu_length_size,
            sps,
            pps,
        })
    }

    /// Get profile name
    pub fn profile_name(&self) -> &'static str {
        match self.profile {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4",
            _ => "Unknown",
        }
    }

    /// Get level as string (e.g., "3.1")
    pub fn level_string(&self) -> String {
        format!("{}.{}", self.level / 10, self.level % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parameter_sets() -> (Vec<Bytes>, Vec<Bytes>) {
        // High profile, level 3.1
        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        let pps = vec![Bytes::from_static(&[0x68, 0xEF, 0x38])];
        (sps, pps)
    }

    #[test]
    fn test_from_parameter_sets() {
        let (sps, pps) = test_parameter_sets();
        let config = AvcConfig::from_parameter_sets(sps, pps).unwrap();
        assert_eq!(config.profile, 100);
        assert_eq!(config.compatibility, 0);
        assert_eq!(config.level, 31);
        assert_eq!(config.profile_name(), "High");
        assert_eq!(config.level_string(), "3.1");
    }

    #[test]
    fn test_config_record_layout() {
        let (sps, pps) = test_parameter_sets();
        let config = AvcConfig::from_parameter_sets(sps, pps).unwrap();
        let record = config.config_record();

        assert_eq!(
            &record[..],
            &[
                0x01, // version
                0x64, // profile (High)
                0x00, // compatibility
                0x1F, // level 3.1
                0xFF, // nalu length size = 4
                0xE1, // 1 SPS
                0x00, 0x04, // SPS length
                0x67, 0x64, 0x00, 0x1F, // SPS data
                0x01, // 1 PPS
                0x00, 0x03, // PPS length
                0x68, 0xEF, 0x38, // PPS data
            ]
        );
    }

    #[test]
    fn test_build_parse_roundtrip() {
        let (sps, pps) = test_parameter_sets();
        let config = AvcConfig::from_parameter_sets(sps, pps).unwrap();
        let parsed = AvcConfig::parse(config.config_record()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_parameter_sets() {
        assert!(AvcConfig::from_parameter_sets(vec![], vec![]).is_err());

        let sps = vec![Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F])];
        assert!(AvcConfig::from_parameter_sets(sps, vec![]).is_err());
    }

    #[test]
    fn test_parse_short_input() {
        assert!(AvcConfig::parse(Bytes::from_static(&[0x01, 0x64])).is_err());
    }
}
