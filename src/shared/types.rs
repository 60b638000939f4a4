//! Common types used across the application

use solana_sdk::{pubkey, pubkey::Pubkey};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::StartupError;

pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// Token used to pay for purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteToken {
    Wsol,
    Usdc,
}

impl QuoteToken {
    pub fn mint(&self) -> Pubkey {
        match self {
            QuoteToken::Wsol => WSOL_MINT,
            QuoteToken::Usdc => USDC_MINT,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            QuoteToken::Wsol => 9,
            QuoteToken::Usdc => 6,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            QuoteToken::Wsol => "WSOL",
            QuoteToken::Usdc => "USDC",
        }
    }

    /// Raw amount in the token's smallest unit
    pub fn amount(&self, ui_amount: &str) -> anyhow::Result<Amount> {
        Ok(Amount::new(
            parse_ui_amount(ui_amount, self.decimals())?,
            self.decimals(),
        ))
    }
}

impl FromStr for QuoteToken {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WSOL" => Ok(QuoteToken::Wsol),
            "USDC" => Ok(QuoteToken::Usdc),
            other => Err(StartupError::UnsupportedQuoteMint(other.to_string())),
        }
    }
}

impl fmt::Display for QuoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Amount representation with precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount {
    pub value: u64,
    pub decimals: u8,
}

impl Amount {
    pub fn new(value: u64, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn to_ui(&self) -> f64 {
        self.value as f64 / 10_f64.powi(self.decimals as i32)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.to_ui())
    }
}

/// Parse a decimal string such as "0.05" into raw units without going through floats.
pub fn parse_ui_amount(input: &str, decimals: u8) -> anyhow::Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("empty amount");
    }

    let (whole, fraction) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if fraction.len() > decimals as usize {
        anyhow::bail!("amount {} has more than {} decimals", input, decimals);
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("invalid amount: {}", input);
    }

    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| anyhow::anyhow!("too many decimals: {}", decimals))?;
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse()? };
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction: u64 = if padded.is_empty() { 0 } else { padded.parse()? };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| anyhow::anyhow!("amount overflows u64: {}", input))
}
