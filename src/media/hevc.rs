//! H.265/HEVC codec configuration
//!
//! Enhanced RTMP transports HEVC with FOURCC `hvc1` signaling and announces
//! decoder parameters in an HEVCDecoderConfigurationRecord carried by the
//! SequenceStart packet.
//!
//! HEVCDecoderConfigurationRecord (ISO/IEC 14496-15):
//! ```text
//! configurationVersion (1)
//! | general_profile_space (2 bits) + general_tier_flag (1) + general_profile_idc (5)
//! | general_profile_compatibility_flags (4)
//! | general_constraint_indicator_flags (6)
//! | general_level_idc (1)
//! | min_spatial_segmentation_idc (2, upper 4 bits reserved)
//! | parallelismType (1, upper 6 bits reserved)
//! | chromaFormat (1, upper 6 bits reserved)
//! | bitDepthLumaMinus8 (1, upper 5 bits reserved)
//! | bitDepthChromaMinus8 (1, upper 5 bits reserved)
//! | avgFrameRate (2)
//! | constantFrameRate (2 bits) + numTemporalLayers (3) + temporalIdNested (1)
//!   + lengthSizeMinusOne (2)
//! | numOfArrays (1)
//! | { array_completeness (1 bit) + reserved (1) + NAL_unit_type (6)
//!     | numNalus (2) | { nalUnitLength (2) | nalUnit }* }*
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};

/// NAL unit type codes for the parameter-set arrays
const NAL_VPS: u8 = 32;
const NAL_SPS: u8 = 33;
const NAL_PPS: u8 = 34;

/// HEVC decoder configuration: general profile/tier/level plus VPS/SPS/PPS
#[derive(Debug, Clone, PartialEq)]
pub struct HevcConfig {
    /// general_profile_space (2 bits)
    pub profile_space: u8,
    /// general_tier_flag
    pub tier_flag: bool,
    /// general_profile_idc (1=Main, 2=Main10)
    pub profile_idc: u8,
    /// general_profile_compatibility_flags
    pub profile_compatibility: u32,
    /// general_constraint_indicator_flags (48 bits)
    pub constraint_flags: u64,
    /// general_level_idc (e.g., 120 = level 4.0)
    pub level_idc: u8,
    /// chroma_format_idc (1 = 4:2:0)
    pub chroma_format: u8,
    /// bit_depth_luma_minus8
    pub bit_depth_luma_minus8: u8,
    /// bit_depth_chroma_minus8
    pub bit_depth_chroma_minus8: u8,
    /// sps_temporal_id_nesting_flag
    pub temporal_id_nested: bool,
    /// sps_max_sub_layers_minus1 + 1
    pub num_temporal_layers: u8,
    /// NALU length size minus 1 (usually 3, meaning 4-byte lengths)
    pub nalu_length_size: u8,
    /// Video Parameter Sets
    pub vps: Vec<Bytes>,
    /// Sequence Parameter Sets
    pub sps: Vec<Bytes>,
    /// Picture Parameter Sets
    pub pps: Vec<Bytes>,
}

impl HevcConfig {
    /// Build a config from encoder-supplied parameter sets with Main-profile
    /// defaults for the general_* fields.
    ///
    /// The profile/tier/level fields describe decoder requirements; encoders
    /// that know better can overwrite them before serialization.
    pub fn from_parameter_sets(vps: Vec<Bytes>, sps: Vec<Bytes>, pps: Vec<Bytes>) -> Result<Self> {
        if vps.is_empty() || sps.is_empty() || pps.is_empty() {
            return Err(MediaError::InvalidHevcConfig.into());
        }
        if vps.len() > 0xFFFF || sps.len() > 0xFFFF || pps.len() > 0xFFFF {
            return Err(MediaError::InvalidHevcConfig.into());
        }

        Ok(HevcConfig {
            profile_space: 0,
            tier_flag: false,
            profile_idc: 1, // Main
            profile_compatibility: 0x6000_0000,
            constraint_flags: 0xB000_0000_0000,
            level_idc: 120, // 4.0
            chroma_format: 1,
            bit_depth_luma_minus8: 0,
            bit_depth_chroma_minus8: 0,
            temporal_id_nested: true,
            num_temporal_layers: 1,
            nalu_length_size: 4,
            vps,
            sps,
            pps,
        })
    }

    /// Serialize to an HEVCDecoderConfigurationRecord.
    pub fn config_record(&self) -> Bytes {
        let array_size = |units: &[Bytes]| 3 + units.iter().map(|u| 2 + u.len()).sum::<usize>();
        let size =
            23 + array_size(&self.vps) + array_size(&self.sps) + array_size(&self.pps);
        let mut buf = BytesMut::with_capacity(size);

        buf.put_u8(1); // configurationVersion
        buf.put_u8(
            self.profile_space << 6 | (self.tier_flag as u8) << 5 | (self.profile_idc & 0x1F),
        );
        buf.put_u32(self.profile_compatibility);
        // 48-bit constraint indicator flags
        buf.put_slice(&self.constraint_flags.to_be_bytes()[2..]);
        buf.put_u8(self.level_idc);
        buf.put_u16(0xF000); // reserved + min_spatial_segmentation_idc = 0
        buf.put_u8(0xFC); // reserved + parallelismType = 0
        buf.put_u8(0xFC | (self.chroma_format & 0x03));
        buf.put_u8(0xF8 | (self.bit_depth_luma_minus8 & 0x07));
        buf.put_u8(0xF8 | (self.bit_depth_chroma_minus8 & 0x07));
        buf.put_u16(0); // avgFrameRate unspecified
        buf.put_u8(
            (self.num_temporal_layers & 0x07) << 3
                | (self.temporal_id_nested as u8) << 2
                | (self.nalu_length_size - 1),
        );

        buf.put_u8(3); // numOfArrays: VPS, SPS, PPS
        for (nal_type, units) in [
            (NAL_VPS, &self.vps),
            (NAL_SPS, &self.sps),
            (NAL_PPS, &self.pps),
        ] {
            buf.put_u8(0x80 | nal_type); // array_completeness set
            buf.put_u16(units.len() as u16);
            for unit in units.iter() {
                buf.put_u16(unit.len() as u16);
                buf.put_slice(unit);
            }
        }

        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parameter_sets() -> (Vec<Bytes>, Vec<Bytes>, Vec<Bytes>) {
        (
            vec![Bytes::from_static(&[0x40, 0x01, 0x0C])],
            vec![Bytes::from_static(&[0x42, 0x01, 0x01, 0x01])],
            vec![Bytes::from_static(&[0x44, 0x01, 0xC0])],
        )
    }

    #[test]
    fn test_from_parameter_sets_defaults() {
        let (vps, sps, pps) = test_parameter_sets();
        let config = HevcConfig::from_parameter_sets(vps, sps, pps).unwrap();
        assert_eq!(config.profile_idc, 1);
        assert_eq!(config.level_idc, 120);
        assert_eq!(config.nalu_length_size, 4);
    }

    #[test]
    fn test_config_record_header() {
        let (vps, sps, pps) = test_parameter_sets();
        let config = HevcConfig::from_parameter_sets(vps, sps, pps).unwrap();
        let record = config.config_record();

        assert_eq!(record[0], 0x01); // version
        assert_eq!(record[1], 0x01); // space=0, tier=0, profile=Main
        assert_eq!(record[12], 120); // level 4.0
        assert_eq!(record[13], 0xF0); // reserved | min_spatial_segmentation high
        assert_eq!(record[21], 0x0F); // 1 layer, nested, 4-byte lengths
        assert_eq!(record[22], 3); // numOfArrays
    }

    #[test]
    fn test_config_record_arrays() {
        let (vps, sps, pps) = test_parameter_sets();
        let config = HevcConfig::from_parameter_sets(vps, sps, pps).unwrap();
        let record = config.config_record();

        // First array starts right after the 23-byte header
        assert_eq!(record[23], 0x80 | 32); // complete VPS array
        assert_eq!(&record[24..26], &[0x00, 0x01]); // one VPS
        assert_eq!(&record[26..28], &[0x00, 0x03]); // 3-byte VPS
        assert_eq!(&record[28..31], &[0x40, 0x01, 0x0C]);
        assert_eq!(record[31], 0x80 | 33); // complete SPS array
    }

    #[test]
    fn test_missing_parameter_sets() {
        let (vps, sps, _) = test_parameter_sets();
        assert!(HevcConfig::from_parameter_sets(vps, sps, vec![]).is_err());
    }
}
