use crate::buffer::BufferView;
use crate::event_rule::domain::{DomainType, Loglevel, LoglevelType};
use crate::fields::cstr::non_empty;
use crate::fields::{required, wire_len, NoDefault};
use crate::fields::{FromBuffer, FromBytes, FromBytesError, FromBytesResult, ToBytes};
use crate::{Error, Validate};
use std::ffi::{CStr, CString};
use std::io::Write;

// domain:i8, loglevel_type:i8, loglevel_value:i32, then four u32 lengths/counts
const HEADER_SIZE: usize = 1 + 1 + 4 + 4 * 4;
const EXCLUSION_LEN_SIZE: usize = 4;

/// # A rule matching tracepoints by name
///
/// The rule selects the tracepoints of one [`DomainType`] whose name matches a glob
/// `pattern`, optionally restricted by a filter expression, a loglevel criterion, and a list
/// of excluded names.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TracepointRule {
    domain: DomainType,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    pattern: Option<CString>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_option::serialize")
    )]
    filter_expression: Option<CString>,
    loglevel: Loglevel,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::fields::cstr::serde::cstr_vec::serialize")
    )]
    exclusions: Vec<CString>,
}

impl TracepointRule {
    /// Create a rule for `domain`, matching all loglevels
    ///
    /// The domain cannot be changed later. [`DomainType::None`] is rejected.
    pub fn new(domain: DomainType) -> Result<Self, Error> {
        if domain == DomainType::None {
            return Err(Error::Invalid("tracepoint rule needs a domain"));
        }

        Ok(Self {
            domain,
            pattern: None,
            filter_expression: None,
            loglevel: Loglevel::All,
            exclusions: Vec::new(),
        })
    }

    /// The domain the rule applies to
    pub fn domain_type(&self) -> DomainType {
        self.domain
    }

    /// Set the tracepoint name pattern (a glob, e.g. `my_app:*`)
    pub fn set_pattern(&mut self, pattern: &CStr) -> Result<(), Error> {
        self.pattern = Some(non_empty(pattern, "empty tracepoint pattern")?);
        Ok(())
    }

    /// Get the tracepoint name pattern
    pub fn pattern(&self) -> Result<&CStr, Error> {
        self.pattern.as_deref().ok_or(Error::Unset)
    }

    /// Set the filter expression
    pub fn set_filter(&mut self, expression: &CStr) -> Result<(), Error> {
        self.filter_expression = Some(non_empty(expression, "empty filter expression")?);
        Ok(())
    }

    /// Get the filter expression
    pub fn filter(&self) -> Result<&CStr, Error> {
        self.filter_expression.as_deref().ok_or(Error::Unset)
    }

    /// Match events of exactly this loglevel
    pub fn set_loglevel(&mut self, level: i32) {
        self.loglevel = Loglevel::Single(level);
    }

    /// Match events of this loglevel or a more severe one
    pub fn set_loglevel_range(&mut self, level: i32) {
        self.loglevel = Loglevel::Range(level);
    }

    /// Match events of every loglevel
    pub fn set_loglevel_all(&mut self) {
        self.loglevel = Loglevel::All;
    }

    /// How the loglevel value is interpreted
    pub fn loglevel_type(&self) -> LoglevelType {
        self.loglevel.loglevel_type()
    }

    /// The loglevel value (unset when matching all loglevels)
    pub fn loglevel(&self) -> Result<i32, Error> {
        self.loglevel.value().ok_or(Error::Unset)
    }

    /// Replace the list of excluded tracepoint names
    ///
    /// The list must not be empty and no name can be empty. On failure (including
    /// allocation failure) the previous list is left unchanged.
    pub fn set_exclusions(&mut self, exclusions: &[&CStr]) -> Result<(), Error> {
        if exclusions.is_empty() {
            return Err(Error::Invalid("empty exclusion list"));
        }

        let mut values = Vec::new();
        values.try_reserve_exact(exclusions.len())?;
        for exclusion in exclusions {
            values.push(non_empty(exclusion, "empty exclusion")?);
        }

        self.exclusions = values;
        Ok(())
    }

    /// The number of excluded names
    pub fn exclusions_count(&self) -> usize {
        self.exclusions.len()
    }

    /// Get an excluded name by index
    pub fn exclusion_at(&self, index: usize) -> Result<&CStr, Error> {
        self.exclusions
            .get(index)
            .map(CString::as_c_str)
            .ok_or(Error::Invalid("exclusion index out of range"))
    }

    /// Iterate over the excluded names, in the order they were set
    pub fn exclusions(&self) -> impl Iterator<Item = &CStr> {
        self.exclusions.iter().map(CString::as_c_str)
    }

    fn exclusions_wire_len(&self) -> usize {
        self.exclusions
            .iter()
            .map(|e| EXCLUSION_LEN_SIZE + e.binary_size())
            .sum()
    }
}

impl Validate for TracepointRule {
    fn validate(&self) -> bool {
        if self.pattern.is_none() {
            log::debug!("Invalid tracepoint rule: a pattern must be set");
            return false;
        }

        self.domain != DomainType::None
    }
}

/// Cheap checks first, then the strings. Exclusions compare in order.
impl PartialEq for TracepointRule {
    fn eq(&self, other: &Self) -> bool {
        if self.domain != other.domain
            || self.exclusions.len() != other.exclusions.len()
            || self.filter_expression.is_some() != other.filter_expression.is_some()
        {
            return false;
        }

        self.pattern == other.pattern
            && self.filter_expression == other.filter_expression
            && self.loglevel == other.loglevel
            && self.exclusions == other.exclusions
    }
}

impl Eq for TracepointRule {}

impl ToBytes for TracepointRule {
    fn binary_size(&self) -> usize {
        HEADER_SIZE
            + self.pattern.binary_size()
            + self.filter_expression.binary_size()
            + self.exclusions_wire_len()
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let pattern = required(&self.pattern, "pattern")?;
        let exclusions_count = u32::try_from(self.exclusions.len())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let exclusions_len = u32::try_from(self.exclusions_wire_len())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        (self.domain as i8).write(&mut writer)?;
        (self.loglevel.loglevel_type() as i8).write(&mut writer)?;
        self.loglevel.value().unwrap_or(0).write(&mut writer)?;
        wire_len(Some(pattern))?.write(&mut writer)?;
        wire_len(self.filter_expression.as_deref())?.write(&mut writer)?;
        exclusions_count.write(&mut writer)?;
        exclusions_len.write(&mut writer)?;

        pattern.write(&mut writer)?;
        self.filter_expression.write(&mut writer)?;
        for exclusion in &self.exclusions {
            wire_len(Some(exclusion.as_c_str()))?.write(&mut writer)?;
            exclusion.write(&mut writer)?;
        }

        Ok(())
    }

    fn default_repr() -> impl ToBytes {
        NoDefault
    }
}

impl FromBuffer for TracepointRule {
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)> {
        let mut header = view.header(HEADER_SIZE)?;
        let domain = i8::from_bytes(&mut header)?;
        let loglevel_type = i8::from_bytes(&mut header)?;
        let loglevel_value = i32::from_bytes(&mut header)?;
        let pattern_len = u32::from_bytes(&mut header)? as usize;
        let filter_len = u32::from_bytes(&mut header)? as usize;
        let exclusions_count = u32::from_bytes(&mut header)?;
        let exclusions_len = u32::from_bytes(&mut header)? as usize;

        let domain = DomainType::from_wire(domain)?;
        let loglevel = Loglevel::from_wire(loglevel_type, loglevel_value)?;

        let mut offset = HEADER_SIZE;
        let pattern = view.required_cstr_at(offset, pattern_len, "pattern")?;
        offset += pattern_len;

        let filter_expression = view.optional_cstr_at(offset, filter_len)?;
        offset += filter_len;

        // each exclusion takes at least five bytes, so the loop is bounded by the buffer size
        let exclusions_start = offset;
        let mut exclusions = Vec::new();
        for _ in 0..exclusions_count {
            let mut len_field = view.from_view(offset, None)?.header(EXCLUSION_LEN_SIZE)?;
            let len = u32::from_bytes(&mut len_field)? as usize;
            offset += EXCLUSION_LEN_SIZE;

            exclusions.push(view.required_cstr_at(offset, len, "exclusion")?);
            offset += len;
        }

        if offset - exclusions_start != exclusions_len {
            return Err(FromBytesError::LengthMismatch {
                declared: exclusions_len,
                actual: offset - exclusions_start,
            });
        }

        Ok((
            offset,
            Self {
                domain,
                pattern: Some(pattern),
                filter_expression,
                loglevel,
                exclusions,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{TracepointRule, HEADER_SIZE};
    use crate::buffer::BufferView;
    use crate::event_rule::domain::loglevels::{LOGLEVEL_INFO, LOGLEVEL_WARNING};
    use crate::event_rule::domain::{DomainType, LoglevelType};
    use crate::fields::{FromBuffer, FromBytesError, ToBytes};
    use crate::{Error, Validate};

    fn ust_rule() -> TracepointRule {
        let mut rule = TracepointRule::new(DomainType::Ust).unwrap();
        rule.set_pattern(c"my_event_*").unwrap();
        rule
    }

    fn round_trip(rule: &TracepointRule) -> TracepointRule {
        let mut binary = Vec::new();
        rule.write(&mut binary).unwrap();
        hexdump::hexdump(binary.as_slice());
        assert_eq!(binary.len(), rule.binary_size());

        let (consumed, loaded) = TracepointRule::from_buffer(&BufferView::new(&binary)).unwrap();
        assert_eq!(consumed, binary.len());
        loaded
    }

    #[test]
    fn test_domain_restriction() {
        assert!(matches!(
            TracepointRule::new(DomainType::None),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_accessors() {
        let mut rule = TracepointRule::new(DomainType::Ust).unwrap();
        assert_eq!(rule.domain_type(), DomainType::Ust);
        assert!(matches!(rule.pattern(), Err(Error::Unset)));
        assert!(matches!(rule.filter(), Err(Error::Unset)));
        assert!(!rule.validate());

        rule.set_pattern(c"my_event_*").unwrap();
        assert_eq!(rule.pattern().unwrap(), c"my_event_*");
        assert!(matches!(rule.set_pattern(c""), Err(Error::Invalid(_))));
        assert_eq!(rule.pattern().unwrap(), c"my_event_*");

        rule.set_filter(c"msg_id == 23 && size >= 2048").unwrap();
        assert_eq!(rule.filter().unwrap(), c"msg_id == 23 && size >= 2048");
        assert!(rule.set_filter(c"").is_err());

        assert_eq!(rule.loglevel_type(), LoglevelType::All);
        assert!(matches!(rule.loglevel(), Err(Error::Unset)));

        rule.set_loglevel(LOGLEVEL_INFO);
        assert_eq!(rule.loglevel_type(), LoglevelType::Single);
        assert_eq!(rule.loglevel().unwrap(), LOGLEVEL_INFO);

        rule.set_loglevel_range(LOGLEVEL_WARNING);
        assert_eq!(rule.loglevel_type(), LoglevelType::Range);
        assert_eq!(rule.loglevel().unwrap(), LOGLEVEL_WARNING);

        rule.set_loglevel_all();
        assert_eq!(rule.loglevel_type(), LoglevelType::All);

        assert!(rule.validate());
    }

    #[test]
    fn test_exclusions() {
        let mut rule = ust_rule();
        assert_eq!(rule.exclusions_count(), 0);
        assert!(matches!(rule.set_exclusions(&[]), Err(Error::Invalid(_))));

        rule.set_exclusions(&[c"my_event_test1", c"my_event_test2", c"my_event_test3"])
            .unwrap();
        assert_eq!(rule.exclusions_count(), 3);
        assert_eq!(rule.exclusion_at(1).unwrap(), c"my_event_test2");
        assert!(rule.exclusion_at(3).is_err());

        assert!(rule.set_exclusions(&[c"a", c""]).is_err());
        assert_eq!(
            rule.exclusions().collect::<Vec<_>>(),
            vec![c"my_event_test1", c"my_event_test2", c"my_event_test3"]
        );
    }

    #[test]
    fn test_round_trip_minimal() {
        let rule = ust_rule();
        assert_eq!(round_trip(&rule), rule);
    }

    #[test]
    fn test_round_trip_full() {
        let mut rule = ust_rule();
        rule.set_filter(c"msg_id == 23 && size >= 2048").unwrap();
        rule.set_loglevel_range(LOGLEVEL_WARNING);
        rule.set_exclusions(&[c"my_event_test1", c"my_event_test2", c"my_event_test3"])
            .unwrap();

        let loaded = round_trip(&rule);
        assert_eq!(loaded, rule);
        assert_eq!(loaded.exclusion_at(2).unwrap(), c"my_event_test3");
        assert_eq!(loaded.loglevel().unwrap(), LOGLEVEL_WARNING);
    }

    #[test]
    fn test_round_trip_single_exclusion() {
        let mut rule = TracepointRule::new(DomainType::Kernel).unwrap();
        rule.set_pattern(c"sched_*").unwrap();
        rule.set_loglevel(LOGLEVEL_INFO);
        rule.set_exclusions(&[c"sched_switch"]).unwrap();

        assert_eq!(round_trip(&rule), rule);
    }

    #[test]
    fn test_wire_layout() {
        let mut rule = ust_rule();
        rule.set_exclusions(&[c"ab"]).unwrap();

        let mut binary = Vec::new();
        rule.write(&mut binary).unwrap();

        assert_eq!(binary[0], DomainType::Ust as u8);
        assert_eq!(binary[1], LoglevelType::All as u8);
        assert_eq!(&binary[6..10], 11u32.to_ne_bytes());
        assert_eq!(&binary[10..14], 0u32.to_ne_bytes());
        assert_eq!(&binary[14..18], 1u32.to_ne_bytes());
        assert_eq!(&binary[18..22], 7u32.to_ne_bytes());
        assert_eq!(&binary[HEADER_SIZE..HEADER_SIZE + 11], b"my_event_*\0");
        assert_eq!(&binary[HEADER_SIZE + 11..HEADER_SIZE + 15], 3u32.to_ne_bytes());
        assert_eq!(&binary[HEADER_SIZE + 15..], b"ab\0");
    }

    #[test]
    fn test_exclusion_order_matters() {
        let mut a = ust_rule();
        a.set_exclusions(&[c"a", c"b"]).unwrap();
        let mut b = ust_rule();
        b.set_exclusions(&[c"b", c"a"]).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_inequality() {
        let a = ust_rule();

        let mut b = ust_rule();
        b.set_filter(c"x == 1").unwrap();
        assert_ne!(a, b);

        let mut c = ust_rule();
        c.set_loglevel(LOGLEVEL_INFO);
        assert_ne!(a, c);

        let mut d = TracepointRule::new(DomainType::Jul).unwrap();
        d.set_pattern(c"my_event_*").unwrap();
        assert_ne!(a, d);

        let mut e = ust_rule();
        e.set_pattern(c"other").unwrap();
        assert_ne!(a, e);
    }

    #[test]
    fn test_unset_pattern_cannot_be_written() {
        let rule = TracepointRule::new(DomainType::Ust).unwrap();
        let mut binary = Vec::new();
        assert!(rule.write(&mut binary).is_err());
    }

    #[test]
    fn test_malformed_input() {
        let mut rule = ust_rule();
        rule.set_exclusions(&[c"ab"]).unwrap();
        let mut binary = Vec::new();
        rule.write(&mut binary).unwrap();

        // truncated header
        let short = &binary[..HEADER_SIZE - 1];
        assert!(matches!(
            TracepointRule::from_buffer(&BufferView::new(short)),
            Err(FromBytesError::TruncatedField { .. })
        ));

        // truncated payload
        let short = &binary[..binary.len() - 1];
        assert!(TracepointRule::from_buffer(&BufferView::new(short)).is_err());

        // bad domain
        let mut bad = binary.clone();
        bad[0] = 0;
        assert!(matches!(
            TracepointRule::from_buffer(&BufferView::new(&bad)),
            Err(FromBytesError::InvalidDomain(0))
        ));

        // bad loglevel type
        let mut bad = binary.clone();
        bad[1] = 7;
        assert!(matches!(
            TracepointRule::from_buffer(&BufferView::new(&bad)),
            Err(FromBytesError::InvalidLoglevelType(7))
        ));

        // pattern length past the actual terminator
        let mut bad = binary.clone();
        bad[6..10].copy_from_slice(&12u32.to_ne_bytes());
        assert!(TracepointRule::from_buffer(&BufferView::new(&bad)).is_err());

        // wrong total exclusion length
        let mut bad = binary.clone();
        bad[18..22].copy_from_slice(&8u32.to_ne_bytes());
        assert!(matches!(
            TracepointRule::from_buffer(&BufferView::new(&bad)),
            Err(FromBytesError::LengthMismatch {
                declared: 8,
                actual: 7
            })
        ));

        // huge exclusion count
        let mut bad = binary.clone();
        bad[14..18].copy_from_slice(&u32::MAX.to_ne_bytes());
        assert!(TracepointRule::from_buffer(&BufferView::new(&bad)).is_err());
    }
}
