//! Process-wide packing configuration.
//!
//! A [`Mode`] is built once at startup, validated against the layout this build
//! was compiled with, and then only ever read. Components receive it by value;
//! [`install`] additionally publishes one for code that has no runtime at hand.
use std::{fmt, mem, sync::OnceLock};

use bitflags::bitflags;

use crate::{ConfigError, Tag, heap::HeapCell, tag::TAG_BITS};

bitflags! {
    /// Status bits reported as the mode word.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u32 {
        const BITPACKED = 1 << 0;
        const NOREFCNT = 1 << 1;
        const NOERRDETECT = 1 << 2;
        const DEBUG = 1 << 3;
    }
}

pub const ENV_PACKING: &str = "BITPACKED";
pub const ENV_NOREFCNT: &str = "BITPACKED_NOREFCNT";
pub const ENV_NOERRDETECT: &str = "BITPACKED_NOERRDETECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCreateInfo {
    pub packing: bool,
    pub simulate_refcounts: bool,
    pub error_detection: bool,
}

impl Default for ModeCreateInfo {
    /// Whatever the crate features selected at build time.
    fn default() -> Self {
        Self {
            packing: cfg!(feature = "packing"),
            simulate_refcounts: !cfg!(feature = "no-refcnt"),
            error_detection: !cfg!(feature = "no-err-detect"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    packing: bool,
    simulate_refcounts: bool,
    error_detection: bool,
}

static INSTALLED: OnceLock<Mode> = OnceLock::new();

fn check_layout(word_bits: u32, tag_bits: u32, tags: &[Tag], align: usize) -> Result<(), ConfigError> {
    if word_bits < 64 {
        return Err(ConfigError::WordTooNarrow { bits: word_bits });
    }
    if let Some(tag) = tags
        .iter()
        .find(|tag| u32::from(tag.bits()).checked_shr(tag_bits).unwrap_or(0) != 0)
    {
        return Err(ConfigError::TagFieldTooNarrow {
            tag: tag.bits(),
            width: tag_bits,
        });
    }
    let required = 1usize.checked_shl(tag_bits).unwrap_or(usize::MAX);
    if align < required {
        return Err(ConfigError::HeapAlignmentTooSmall { align, required });
    }
    Ok(())
}

fn validate_layout() -> Result<(), ConfigError> {
    check_layout(usize::BITS, TAG_BITS, &Tag::ALL, mem::align_of::<HeapCell>())
}

fn parse_switch(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidVariable {
            name,
            value: value.to_owned(),
        }),
    }
}

impl ModeCreateInfo {
    /// Start from the build defaults and apply any of the `BITPACKED*` variables
    /// that `lookup` knows about.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut info = Self::default();
        if let Some(value) = lookup(ENV_PACKING) {
            info.packing = parse_switch(ENV_PACKING, &value)?;
        }
        if let Some(value) = lookup(ENV_NOREFCNT) {
            info.simulate_refcounts = !parse_switch(ENV_NOREFCNT, &value)?;
        }
        if let Some(value) = lookup(ENV_NOERRDETECT) {
            info.error_detection = !parse_switch(ENV_NOERRDETECT, &value)?;
        }
        Ok(info)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

impl Mode {
    pub fn new(info: ModeCreateInfo) -> Result<Self, ConfigError> {
        if info.packing {
            validate_layout()?;
        }
        Ok(Self {
            packing: info.packing,
            simulate_refcounts: info.simulate_refcounts,
            error_detection: info.error_detection,
        })
    }

    /// Packing off. Nothing to validate.
    pub const fn conventional() -> Self {
        Self {
            packing: false,
            simulate_refcounts: true,
            error_detection: true,
        }
    }

    pub fn packed() -> Result<Self, ConfigError> {
        Self::new(ModeCreateInfo {
            packing: true,
            simulate_refcounts: true,
            error_detection: true,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ModeCreateInfo::from_env()?)
    }

    #[inline(always)]
    pub const fn is_packing(&self) -> bool {
        self.packing
    }

    /// Packed values carry a real, bookkept count instead of the sentinel.
    #[inline(always)]
    pub const fn simulates_refcounts(&self) -> bool {
        !self.packing || self.simulate_refcounts
    }

    #[inline(always)]
    pub const fn detects_errors(&self) -> bool {
        !self.packing || self.error_detection
    }

    pub fn mode_word(&self) -> ModeFlags {
        let mut flags = ModeFlags::empty();
        if self.packing {
            flags |= ModeFlags::BITPACKED;
            flags.set(ModeFlags::NOREFCNT, !self.simulate_refcounts);
            flags.set(ModeFlags::NOERRDETECT, !self.error_detection);
        }
        flags.set(ModeFlags::DEBUG, cfg!(debug_assertions));
        flags
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.mode_word();
        let check = |flag| if word.contains(flag) { "ON" } else { "OFF" };
        writeln!(f, "BitPacked Mode: {}", check(ModeFlags::BITPACKED))?;
        writeln!(f, "BitPacked No-RefCount Mode: {}", check(ModeFlags::NOREFCNT))?;
        writeln!(
            f,
            "BitPacked No-Error-Detection Mode: {}",
            check(ModeFlags::NOERRDETECT)
        )?;
        write!(f, "Debug Build: {}", check(ModeFlags::DEBUG))
    }
}

/// Publish the process-wide mode. Succeeds once.
pub fn install(mode: Mode) -> Result<&'static Mode, ConfigError> {
    let mut fresh = false;
    let installed = INSTALLED.get_or_init(|| {
        fresh = true;
        mode
    });
    if !fresh {
        return Err(ConfigError::AlreadyInstalled);
    }
    log::debug!("installed mode word {:#010b}", installed.mode_word().bits());
    Ok(installed)
}

pub fn installed() -> Option<&'static Mode> {
    INSTALLED.get()
}
