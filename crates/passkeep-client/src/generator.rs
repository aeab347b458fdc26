//! Random password generation.
//!
//! Each position first picks one of the selected character classes uniformly
//! at random, then a character uniformly within that class. Classes therefore
//! contribute equally regardless of alphabet size.

use rand::Rng;

/// Lowercase letters.
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
/// Decimal digits.
pub const DIGITS: &str = "0123456789";
/// Symbol alphabet.
pub const SYMBOLS: &str = "!@#$%^&*()_+~`|}{[]:;?><,./-=";

/// Shortest password the generator will produce.
pub const MIN_LENGTH: usize = 4;
/// Longest password the generator will produce.
pub const MAX_LENGTH: usize = 50;
/// Length used when none is chosen.
pub const DEFAULT_LENGTH: usize = 8;

/// A character class the generator can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lowercase,
    Digits,
    Symbols,
}

impl CharClass {
    pub const ALL: [Self; 3] = [Self::Lowercase, Self::Digits, Self::Symbols];

    #[must_use]
    pub fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Lowercase => LOWERCASE.as_bytes(),
            Self::Digits => DIGITS.as_bytes(),
            Self::Symbols => SYMBOLS.as_bytes(),
        }
    }
}

/// Why a generation request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("Please select at least one option for password generation")]
    NoClassSelected,

    #[error("Password length must be between {MIN_LENGTH} and {MAX_LENGTH} characters")]
    LengthOutOfRange { length: usize },
}

/// Length and class selection for one generated password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            lowercase: false,
            digits: false,
            symbols: false,
        }
    }
}

impl GeneratorOptions {
    /// Options selecting exactly `classes`.
    #[must_use]
    pub fn with_classes(length: usize, classes: &[CharClass]) -> Self {
        let mut options = Self {
            length,
            ..Self::default()
        };
        for class in classes {
            options.set(*class, true);
        }
        options
    }

    /// Select or deselect one class.
    pub fn set(&mut self, class: CharClass, selected: bool) {
        match class {
            CharClass::Lowercase => self.lowercase = selected,
            CharClass::Digits => self.digits = selected,
            CharClass::Symbols => self.symbols = selected,
        }
    }

    /// The selected classes, in [`CharClass::ALL`] order.
    #[must_use]
    pub fn classes(&self) -> Vec<CharClass> {
        CharClass::ALL
            .into_iter()
            .filter(|c| match c {
                CharClass::Lowercase => self.lowercase,
                CharClass::Digits => self.digits,
                CharClass::Symbols => self.symbols,
            })
            .collect()
    }

    /// Check class selection first, then length.
    ///
    /// # Errors
    ///
    /// Returns the first rule the options break.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(self.lowercase || self.digits || self.symbols) {
            return Err(GeneratorError::NoClassSelected);
        }
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(GeneratorError::LengthOutOfRange {
                length: self.length,
            });
        }
        Ok(())
    }
}

/// Generate a password with the thread-local CSPRNG.
///
/// # Errors
///
/// See [`GeneratorOptions::validate`].
pub fn generate(options: &GeneratorOptions) -> Result<String, GeneratorError> {
    generate_with(options, &mut rand::rng())
}

/// Generate a password drawing from `rng`.
///
/// # Errors
///
/// See [`GeneratorOptions::validate`].
pub fn generate_with<R: Rng + ?Sized>(
    options: &GeneratorOptions,
    rng: &mut R,
) -> Result<String, GeneratorError> {
    options.validate()?;
    let classes = options.classes();

    let password = (0..options.length)
        .map(|_| {
            let alphabet = classes[rng.random_range(0..classes.len())].alphabet();
            char::from(alphabet[rng.random_range(0..alphabet.len())])
        })
        .collect();
    Ok(password)
}
