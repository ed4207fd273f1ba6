/*!
# Library Signature Feed

Источник библиотечных сигнатур (функции, события, константы), с которым
сверяется парсер при разрешении вызовов и идентификаторов, не объявленных
в исходнике.

Данные группируются в именованные подмножества (`lsl`, `os-lsl`, ...);
поиск идёт только по активным подмножествам. Встроенный набор загружается
из `data/lsl_library.toml`.
*/

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{ConstantSignature, EventSignature, FunctionSignature};
use crate::core::errors::SignatureError;

/// Поиск библиотечных сигнатур по имени и перечисление всего набора.
pub trait LibraryDataProvider {
    /// Все перегрузки функции с данным именем (пусто, если функции нет).
    fn functions(&self, name: &str) -> Vec<&FunctionSignature>;
    fn event(&self, name: &str) -> Option<&EventSignature>;
    fn constant(&self, name: &str) -> Option<&ConstantSignature>;

    fn all_functions(&self) -> Vec<&FunctionSignature>;
    fn all_events(&self) -> Vec<&EventSignature>;
    fn all_constants(&self) -> Vec<&ConstantSignature>;

    fn is_function(&self, name: &str) -> bool { !self.functions(name).is_empty() }
    fn is_event(&self, name: &str) -> bool { self.event(name).is_some() }
    fn is_constant(&self, name: &str) -> bool { self.constant(name).is_some() }
}

/// Именованная группа сигнатур.
#[derive(Debug, Clone, Default)]
pub struct SignatureSubset {
    name: String,
    description: String,
    functions: BTreeMap<String, Vec<FunctionSignature>>,
    events: BTreeMap<String, EventSignature>,
    constants: BTreeMap<String, ConstantSignature>,
}

impl SignatureSubset {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }

    /// Добавить функцию. Ключ дубликата: имя + последовательность типов параметров,
    /// поэтому перегрузка с другой арностью допустима.
    pub fn add_function(&mut self, signature: FunctionSignature) -> Result<(), SignatureError> {
        let overloads = self.functions.entry(signature.name.clone()).or_default();
        if overloads.iter().any(|s| s.parameter_types().eq(signature.parameter_types())) {
            return Err(SignatureError::Duplicate { subset: self.name.clone(), signature: signature.to_string() });
        }
        overloads.push(signature);
        Ok(())
    }

    pub fn add_event(&mut self, signature: EventSignature) -> Result<(), SignatureError> {
        if self.events.contains_key(&signature.name) {
            return Err(SignatureError::Duplicate { subset: self.name.clone(), signature: signature.to_string() });
        }
        self.events.insert(signature.name.clone(), signature);
        Ok(())
    }

    pub fn add_constant(&mut self, constant: ConstantSignature) -> Result<(), SignatureError> {
        if self.constants.contains_key(&constant.name) {
            return Err(SignatureError::Duplicate { subset: self.name.clone(), signature: constant.to_string() });
        }
        self.constants.insert(constant.name.clone(), constant);
        Ok(())
    }

    pub fn functions(&self, name: &str) -> &[FunctionSignature] {
        self.functions.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
    pub fn event(&self, name: &str) -> Option<&EventSignature> { self.events.get(name) }
    pub fn constant(&self, name: &str) -> Option<&ConstantSignature> { self.constants.get(name) }

    pub fn function_count(&self) -> usize { self.functions.values().map(Vec::len).sum() }
    pub fn event_count(&self) -> usize { self.events.len() }
    pub fn constant_count(&self) -> usize { self.constants.len() }
}

/// Формат файла данных библиотеки.
#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    active: Vec<String>,
    #[serde(rename = "subset", default)]
    subsets: Vec<SubsetFile>,
}

#[derive(Debug, Deserialize)]
struct SubsetFile {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    functions: Vec<String>,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    constants: Vec<ConstantSignature>,
}

const BUILTIN_LIBRARY: &str = include_str!("../../data/lsl_library.toml");

static BUILTIN: Lazy<LibraryData> = Lazy::new(|| match LibraryData::from_toml_str(BUILTIN_LIBRARY) {
    Ok(data) => data,
    Err(e) => {
        tracing::error!("Built-in library data is invalid: {:#}", e);
        LibraryData::default()
    }
});

/// Библиотечные данные из TOML с набором активных подмножеств.
#[derive(Debug, Clone, Default)]
pub struct LibraryData {
    subsets: Vec<SignatureSubset>,
    active: Vec<String>,
}

impl LibraryData {
    /// Встроенный набор (разбирается один раз на процесс).
    pub fn builtin() -> &'static LibraryData { &BUILTIN }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LibraryFile = toml::from_str(content).context("Failed to parse library data TOML")?;
        let mut data = LibraryData::default();
        for raw in file.subsets {
            let mut subset = SignatureSubset::new(&raw.name).with_description(raw.description);
            for text in &raw.functions {
                let sig = FunctionSignature::parse(text)
                    .with_context(|| format!("Invalid function in subset '{}'", raw.name))?;
                subset.add_function(sig)?;
            }
            for text in &raw.events {
                let sig = EventSignature::parse(text)
                    .with_context(|| format!("Invalid event in subset '{}'", raw.name))?;
                subset.add_event(sig)?;
            }
            for constant in raw.constants {
                subset.add_constant(constant)?;
            }
            tracing::debug!(
                "Loaded library subset '{}': {} functions, {} events, {} constants",
                subset.name(),
                subset.function_count(),
                subset.event_count(),
                subset.constant_count()
            );
            data.add_subset(subset);
        }
        let active = if file.active.is_empty() {
            data.subsets.iter().map(|s| s.name.clone()).collect()
        } else {
            file.active
        };
        data.set_active_subsets(active)?;
        Ok(data)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read library data from {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load library data from {}", path.as_ref().display()))
    }

    /// Добавить подмножество (заменяет одноимённое). Новое подмножество не активируется.
    pub fn add_subset(&mut self, subset: SignatureSubset) {
        match self.subsets.iter_mut().find(|s| s.name == subset.name) {
            Some(existing) => *existing = subset,
            None => self.subsets.push(subset),
        }
    }

    pub fn subsets(&self) -> &[SignatureSubset] { &self.subsets }
    pub fn subset(&self, name: &str) -> Option<&SignatureSubset> { self.subsets.iter().find(|s| s.name == name) }
    pub fn active_subsets(&self) -> &[String] { &self.active }

    pub fn set_active_subsets<I, S>(&mut self, names: I) -> Result<(), SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(unknown) = names.iter().find(|n| self.subset(n).is_none()) {
            return Err(SignatureError::UnknownSubset(unknown.clone()));
        }
        self.active = names;
        Ok(())
    }

    fn active_iter(&self) -> impl Iterator<Item = &SignatureSubset> {
        self.active.iter().filter_map(move |n| self.subset(n))
    }
}

impl LibraryDataProvider for LibraryData {
    fn functions(&self, name: &str) -> Vec<&FunctionSignature> {
        let mut out: Vec<&FunctionSignature> = Vec::new();
        for sig in self.active_iter().flat_map(|s| s.functions(name)) {
            // одна и та же перегрузка может входить в несколько подмножеств
            if !out.iter().any(|o| o.parameter_types().eq(sig.parameter_types())) {
                out.push(sig);
            }
        }
        out
    }

    fn event(&self, name: &str) -> Option<&EventSignature> { self.active_iter().find_map(|s| s.event(name)) }

    fn constant(&self, name: &str) -> Option<&ConstantSignature> { self.active_iter().find_map(|s| s.constant(name)) }

    fn all_functions(&self) -> Vec<&FunctionSignature> {
        let mut names: Vec<&str> = self.active_iter().flat_map(|s| s.functions.keys().map(String::as_str)).collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter().flat_map(|n| self.functions(n)).collect()
    }

    fn all_events(&self) -> Vec<&EventSignature> {
        let mut out: BTreeMap<&str, &EventSignature> = BTreeMap::new();
        for subset in self.active_iter() {
            for (name, ev) in &subset.events {
                out.entry(name.as_str()).or_insert(ev);
            }
        }
        out.into_values().collect()
    }

    fn all_constants(&self) -> Vec<&ConstantSignature> {
        let mut out: BTreeMap<&str, &ConstantSignature> = BTreeMap::new();
        for subset in self.active_iter() {
            for (name, c) in &subset.constants {
                out.entry(name.as_str()).or_insert(c);
            }
        }
        out.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::{LslType, Parameter};

    #[test]
    fn duplicate_function_is_rejected() {
        let mut subset = SignatureSubset::new("lsl");
        let two = FunctionSignature::new(
            LslType::Void,
            "f",
            vec![Parameter::new(LslType::Integer, "a"), Parameter::new(LslType::String, "b")],
        );
        subset.add_function(two.clone()).unwrap();
        let err = subset.add_function(two).unwrap_err();
        assert!(matches!(err, SignatureError::Duplicate { ref subset, .. } if subset == "lsl"));

        let one = FunctionSignature::new(LslType::Void, "f", vec![Parameter::new(LslType::Integer, "a")]);
        subset.add_function(one).unwrap();
        assert_eq!(subset.functions("f").len(), 2);
    }

    #[test]
    fn builtin_library_loads() {
        let lib = LibraryData::builtin();
        assert!(lib.is_function("llSay"));
        assert!(lib.is_event("state_entry"));
        let pi = lib.constant("PI").unwrap();
        assert_eq!(pi.ty, LslType::Float);
        assert_eq!(lib.functions("llAbs")[0].to_string(), "integer llAbs(integer val)");
    }

    #[test]
    fn only_active_subsets_are_searched() {
        let toml = r#"
            active = ["base"]

            [[subset]]
            name = "base"
            functions = ["integer llAbs(integer val)"]

            [[subset]]
            name = "extra"
            functions = ["osSetSpeed(key id, float mult)"]
            constants = [{ name = "OS_X", type = "integer", value = "1" }]
        "#;
        let mut lib = LibraryData::from_toml_str(toml).unwrap();
        assert!(!lib.is_function("osSetSpeed"));
        lib.set_active_subsets(["base", "extra"]).unwrap();
        assert!(lib.is_function("osSetSpeed"));
        assert!(lib.is_constant("OS_X"));
        assert_eq!(lib.set_active_subsets(["nope"]).unwrap_err(), SignatureError::UnknownSubset("nope".into()));
    }

    #[test]
    fn duplicate_in_file_fails_load() {
        let toml = r#"
            [[subset]]
            name = "base"
            functions = ["integer f(integer a)", "float f(integer b)"]
        "#;
        assert!(LibraryData::from_toml_str(toml).is_err());
    }
}
