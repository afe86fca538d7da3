//! Text block translation on top of a loaded model.

use crate::error::{Error, Result};
use crate::package::PackageRegistry;

/// Separator between translation units of a text block.
pub const UNIT_SEPARATOR: &str = "\n\n";

/// Anything that can translate a block of text.
///
/// Implemented by [`Translator`] and by any closure
/// `Fn(&str) -> Result<String>`.
pub trait Translate {
    /// Translate `text`.
    fn translate(&self, text: &str) -> Result<String>;
}

impl<F> Translate for F
where
    F: Fn(&str) -> Result<String>,
{
    fn translate(&self, text: &str) -> Result<String> {
        self(text)
    }
}

/// One candidate translation produced by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Translated text
    pub value: String,
    /// Model score, when the backend reports one
    pub score: Option<f32>,
}

impl Hypothesis {
    /// Create a hypothesis without a score.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            score: None,
        }
    }
}

/// A loaded translation model for one language pair.
pub trait TranslationModel {
    /// Return up to `n` hypotheses for `text`, best first.
    fn hypotheses(&self, text: &str, n: usize) -> Result<Vec<Hypothesis>>;
}

/// Translates text blocks unit by unit with a loaded model.
pub struct Translator {
    from_code: String,
    to_code: String,
    model: Box<dyn TranslationModel>,
}

impl Translator {
    /// Wrap a model translating `from_code` into `to_code`.
    pub fn new(
        from_code: impl Into<String>,
        to_code: impl Into<String>,
        model: impl TranslationModel + 'static,
    ) -> Self {
        Self {
            from_code: from_code.into(),
            to_code: to_code.into(),
            model: Box::new(model),
        }
    }

    /// Source language code.
    pub fn from_code(&self) -> &str {
        &self.from_code
    }

    /// Target language code.
    pub fn to_code(&self) -> &str {
        &self.to_code
    }

    /// Translate a single unit. Blank units become empty; a unit the model
    /// has no hypothesis for is returned unchanged.
    pub fn translate_unit(&self, unit: &str) -> Result<String> {
        if unit.trim().is_empty() {
            return Ok(String::new());
        }

        let best = self.model.hypotheses(unit, 1)?.into_iter().next();
        Ok(match best {
            Some(hypothesis) => hypothesis.value,
            None => {
                log::debug!("No hypothesis for unit of {} chars", unit.len());
                unit.to_string()
            }
        })
    }
}

impl Translate for Translator {
    fn translate(&self, text: &str) -> Result<String> {
        let units = text
            .split(UNIT_SEPARATOR)
            .map(|unit| self.translate_unit(unit))
            .collect::<Result<Vec<_>>>()?;
        Ok(units.join(UNIT_SEPARATOR))
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("from_code", &self.from_code)
            .field("to_code", &self.to_code)
            .finish_non_exhaustive()
    }
}

/// Whether this build can run translation models.
pub const BACKEND_AVAILABLE: bool = cfg!(feature = "ctranslate2");

/// Load the installed model for `from_code -> to_code`.
///
/// Fails with `Error::ModelNotInstalled` when the registry has no package for
/// the exact pair.
pub fn load_translator(
    from_code: &str,
    to_code: &str,
    registry: &PackageRegistry,
) -> Result<Translator> {
    let package = registry
        .find_installed(from_code, to_code)?
        .ok_or_else(|| Error::ModelNotInstalled {
            from: from_code.to_string(),
            to: to_code.to_string(),
        })?;
    log::info!(
        "Loading {} -> {} model from {}",
        from_code,
        to_code,
        package.path.display()
    );

    load_model(from_code, to_code, &package)
}

#[cfg(feature = "ctranslate2")]
fn load_model(
    from_code: &str,
    to_code: &str,
    package: &crate::package::InstalledPackage,
) -> Result<Translator> {
    let model = super::ctranslate2::Ct2Model::load(package)?;
    Ok(Translator::new(from_code, to_code, model))
}

#[cfg(not(feature = "ctranslate2"))]
fn load_model(
    _from_code: &str,
    _to_code: &str,
    _package: &crate::package::InstalledPackage,
) -> Result<Translator> {
    Err(Error::BackendUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Uppercases its input and records every call.
    struct Upper {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl TranslationModel for Upper {
        fn hypotheses(&self, text: &str, _n: usize) -> Result<Vec<Hypothesis>> {
            self.calls.borrow_mut().push(text.to_string());
            Ok(vec![Hypothesis::new(text.to_uppercase())])
        }
    }

    struct Silent;

    impl TranslationModel for Silent {
        fn hypotheses(&self, _text: &str, _n: usize) -> Result<Vec<Hypothesis>> {
            Ok(Vec::new())
        }
    }

    fn upper() -> (Translator, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let model = Upper {
            calls: Rc::clone(&calls),
        };
        (Translator::new("en", "xx", model), calls)
    }

    #[test]
    fn test_single_unit_single_call() {
        let (translator, calls) = upper();
        assert_eq!(translator.translate("Hello world").unwrap(), "HELLO WORLD");
        assert_eq!(calls.borrow().as_slice(), ["Hello world"]);
    }

    #[test]
    fn test_units_keep_count_and_order() {
        let (translator, calls) = upper();
        let out = translator.translate("one\n\ntwo\n\nthree").unwrap();
        assert_eq!(out, "ONE\n\nTWO\n\nTHREE");
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn test_blank_units_skip_model() {
        let (translator, calls) = upper();
        let out = translator.translate("a\n\n   \n\nb").unwrap();
        assert_eq!(out, "A\n\n\n\nB");
        assert_eq!(calls.borrow().as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_single_newlines_stay_in_unit() {
        let (translator, calls) = upper();
        translator.translate("line one\nline two").unwrap();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_no_hypothesis_falls_back_to_source() {
        let translator = Translator::new("en", "xx", Silent);
        assert_eq!(translator.translate("keep me").unwrap(), "keep me");
    }

    #[test]
    fn test_closure_translates() {
        let reverse = |text: &str| -> Result<String> { Ok(text.chars().rev().collect()) };
        assert_eq!(reverse.translate("abc").unwrap(), "cba");
    }

    #[test]
    fn test_model_error_propagates() {
        struct Broken;
        impl TranslationModel for Broken {
            fn hypotheses(&self, _text: &str, _n: usize) -> Result<Vec<Hypothesis>> {
                Err(Error::Translation("decoder failed".into()))
            }
        }
        let translator = Translator::new("en", "xx", Broken);
        assert!(matches!(
            translator.translate("text"),
            Err(Error::Translation(_))
        ));
    }

    #[test]
    fn test_load_translator_requires_installed_package() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PackageRegistry::at(dir.path());
        let err = load_translator("en", "pt", &registry).unwrap_err();
        assert!(matches!(err, Error::ModelNotInstalled { .. }));
    }
}
