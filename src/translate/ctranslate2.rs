//! CTranslate2 backend for installed translation packages.

use ct2rs::tokenizers::sentencepiece::Tokenizer as SentencePieceTokenizer;
use ct2rs::{Config, TranslationOptions, Translator as Ct2Translator};

use crate::error::{Error, Result};
use crate::package::InstalledPackage;

use super::sentence::SentenceSplitter;
use super::translator::{Hypothesis, TranslationModel};

const BEAM_SIZE: usize = 4;
const MAX_DECODING_LENGTH: usize = 256;

/// A CTranslate2 model with its SentencePiece tokenizer.
pub struct Ct2Model {
    translator: Ct2Translator<SentencePieceTokenizer>,
    splitter: SentenceSplitter,
    target_prefix: Option<String>,
}

impl Ct2Model {
    /// Load the model of an installed package.
    pub fn load(package: &InstalledPackage) -> Result<Self> {
        let model_dir = package.model_dir();
        let sp_model = package.sentencepiece_model();
        for required in [&model_dir, &sp_model] {
            if !required.exists() {
                return Err(Error::ModelLoad(format!(
                    "{} is missing from {}",
                    required.display(),
                    package.path.display()
                )));
            }
        }

        let tokenizer = SentencePieceTokenizer::from_file(&sp_model, &sp_model)
            .map_err(|e| Error::ModelLoad(format!("tokenizer: {}", e)))?;
        let translator = Ct2Translator::with_tokenizer(&model_dir, tokenizer, &Config::default())
            .map_err(|e| Error::ModelLoad(e.to_string()))?;

        let target_prefix = Some(package.metadata.target_prefix.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        log::debug!(
            "Loaded CTranslate2 model {} (target prefix {:?})",
            model_dir.display(),
            target_prefix
        );

        Ok(Self {
            translator,
            splitter: SentenceSplitter::new()?,
            target_prefix,
        })
    }

    fn translate_sentences(&self, sentences: &[String]) -> Result<Vec<String>> {
        let options = TranslationOptions::<String, String> {
            beam_size: BEAM_SIZE,
            num_hypotheses: 1,
            max_decoding_length: MAX_DECODING_LENGTH,
            ..Default::default()
        };

        let results = match &self.target_prefix {
            Some(prefix) => {
                let prefixes = vec![vec![prefix.clone()]; sentences.len()];
                self.translator.translate_batch_with_target_prefix(
                    sentences,
                    &prefixes,
                    &options,
                    None,
                )
            }
            None => self.translator.translate_batch(sentences, &options, None),
        }
        .map_err(|e| Error::Translation(e.to_string()))?;

        Ok(results.into_iter().map(|(text, _score)| text).collect())
    }
}

impl TranslationModel for Ct2Model {
    /// Beam search yields a single best hypothesis; `n` above one is not
    /// honoured.
    fn hypotheses(&self, text: &str, _n: usize) -> Result<Vec<Hypothesis>> {
        let sentences = self.splitter.split(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let translated = self.translate_sentences(&sentences)?;
        if translated.iter().all(|s| s.trim().is_empty()) {
            return Ok(Vec::new());
        }
        Ok(vec![Hypothesis::new(translated.join(" "))])
    }
}
