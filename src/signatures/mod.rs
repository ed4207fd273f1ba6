/*!
# Signature Model

Сигнатуры функций, событий и констант LSL: как пользовательских (из дерева),
так и библиотечных (из внешнего источника данных).

Равенство [`FunctionSignature`] учитывает имя, тип результата и последовательность
типов параметров. Имена параметров и флаг variadic в сравнении не участвуют,
но сохраняются для отображения.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::ast_core::NodeId;
use crate::core::errors::{ContractError, ContractResult, SignatureError};

pub mod library;
pub mod parse;

pub use library::{LibraryData, LibraryDataProvider, SignatureSubset};

/// Типы значений LSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LslType {
    #[default]
    Void,
    Integer,
    Float,
    String,
    Key,
    Vector,
    Rotation,
    List,
}

impl LslType {
    pub const ALL_VALUE_TYPES: [LslType; 7] = [
        LslType::Integer,
        LslType::Float,
        LslType::String,
        LslType::Key,
        LslType::Vector,
        LslType::Rotation,
        LslType::List,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            LslType::Void => "void",
            LslType::Integer => "integer",
            LslType::Float => "float",
            LslType::String => "string",
            LslType::Key => "key",
            LslType::Vector => "vector",
            LslType::Rotation => "rotation",
            LslType::List => "list",
        }
    }

    /// Тип из ключевого слова исходника (`void` в LSL не пишется явно).
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "integer" => Some(LslType::Integer),
            "float" => Some(LslType::Float),
            "string" => Some(LslType::String),
            "key" => Some(LslType::Key),
            "vector" => Some(LslType::Vector),
            "rotation" | "quaternion" => Some(LslType::Rotation),
            "list" => Some(LslType::List),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool { matches!(self, LslType::Void) }

    /// Неявное приведение при присваивании / передаче аргумента.
    pub fn is_assignable_from(&self, from: LslType) -> bool {
        *self == from
            || matches!(
                (self, from),
                (LslType::Float, LslType::Integer)
                    | (LslType::String, LslType::Key)
                    | (LslType::Key, LslType::String)
            )
    }

    /// Допустимо ли явное приведение `(self)from`.
    pub fn is_castable_from(&self, from: LslType) -> bool {
        if *self == from || self.is_assignable_from(from) {
            return true;
        }
        match self {
            LslType::Void => false,
            LslType::String | LslType::List => !from.is_void(),
            LslType::Integer | LslType::Float => matches!(from, LslType::Integer | LslType::Float | LslType::String),
            LslType::Key => matches!(from, LslType::String),
            LslType::Vector | LslType::Rotation => matches!(from, LslType::String),
        }
    }
}

impl fmt::Display for LslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.keyword()) }
}

impl FromStr for LslType {
    type Err = SignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "void" => Ok(LslType::Void),
            other => LslType::from_keyword(other).ok_or_else(|| SignatureError::Parse {
                text: s.to_string(),
                reason: "unknown type".into(),
            }),
        }
    }
}

/// Параметр сигнатуры. Для variadic-хвоста тип `void` означает «любой тип».
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: LslType,
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub variadic: bool,
}

impl Parameter {
    pub fn new(ty: LslType, name: impl Into<String>) -> Self {
        Self { ty, name: name.into(), variadic: false }
    }

    pub fn variadic(ty: LslType, name: impl Into<String>) -> Self {
        Self { ty, name: name.into(), variadic: true }
    }

    /// Принимает ли параметр аргумент данного типа.
    pub fn accepts(&self, arg: LslType) -> bool {
        if self.variadic && self.ty.is_void() {
            return !arg.is_void();
        }
        self.ty.is_assignable_from(arg)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.variadic, self.ty) {
            (true, LslType::Void) => write!(f, "any... {}", self.name),
            (true, ty) => write!(f, "{}... {}", ty, self.name),
            (false, ty) => write!(f, "{} {}", ty, self.name),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool { self.ty == other.ty }
}

/// Сигнатура функции.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    #[serde(rename = "returns", default)]
    pub return_type: LslType,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl FunctionSignature {
    pub fn new(return_type: LslType, name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self { return_type, name: name.into(), parameters }
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = LslType> + '_ {
        self.parameters.iter().map(|p| p.ty)
    }

    pub fn has_variadic_parameter(&self) -> bool {
        self.parameters.last().map(|p| p.variadic).unwrap_or(false)
    }

    /// Количество обязательных (не variadic) параметров.
    pub fn concrete_parameter_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.variadic).count()
    }

    /// Проверка списка типов аргументов. `Err(index)` указывает на первый
    /// несовместимый аргумент, `Err(usize::MAX)` на неверное количество.
    pub fn check_arguments(&self, args: &[LslType]) -> Result<(), usize> {
        let concrete = self.concrete_parameter_count();
        let count_ok = if self.has_variadic_parameter() { args.len() >= concrete } else { args.len() == concrete };
        if !count_ok {
            return Err(usize::MAX);
        }
        for (i, arg) in args.iter().enumerate() {
            let param = if i < concrete { &self.parameters[i] } else { &self.parameters[concrete] };
            if !param.accepts(*arg) {
                return Err(i);
            }
        }
        Ok(())
    }

    /// Ключ для поиска дубликатов: имя и типы параметров.
    pub fn duplicate_key(&self) -> (String, Vec<LslType>) {
        (self.name.clone(), self.parameter_types().collect())
    }

    /// Разбор текстового представления, например `integer llAbs(integer val)`.
    pub fn parse(text: &str) -> Result<Self, SignatureError> { parse::parse_function_signature(text) }
}

impl PartialEq for FunctionSignature {
    fn eq(&self, other: &Self) -> bool { signature_matches(self, other) }
}

impl Eq for FunctionSignature {}

impl Hash for FunctionSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.return_type.hash(state);
        for ty in self.parameter_types() {
            ty.hash(state);
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.return_type.is_void() {
            write!(f, "{} ", self.return_type)?;
        }
        write!(f, "{}(", self.name)?;
        write_parameters(f, &self.parameters)?;
        f.write_str(")")
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[Parameter]) -> fmt::Result {
    for (i, p) in parameters.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", p)?;
    }
    Ok(())
}

/// Структурное сравнение двух независимо построенных сигнатур
/// (имя, тип результата, типы параметров).
pub fn signature_matches(a: &FunctionSignature, b: &FunctionSignature) -> bool {
    a.name == b.name && a.return_type == b.return_type && a.parameter_types().eq(b.parameter_types())
}

/// Сигнатура обработчика события.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSignature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl EventSignature {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self { name: name.into(), parameters }
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = LslType> + '_ {
        self.parameters.iter().map(|p| p.ty)
    }

    pub fn parse(text: &str) -> Result<Self, SignatureError> { parse::parse_event_signature(text) }
}

impl PartialEq for EventSignature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.parameter_types().eq(other.parameter_types())
    }
}

impl fmt::Display for EventSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_parameters(f, &self.parameters)?;
        f.write_str(")")
    }
}

/// Библиотечная константа. `value` хранится в виде исходного текста LSL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantSignature {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: LslType,
    pub value: String,
}

impl ConstantSignature {
    pub fn new(name: impl Into<String>, ty: LslType, value: impl Into<String>) -> Self {
        Self { name: name.into(), ty, value: value.into() }
    }
}

impl fmt::Display for ConstantSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {}", self.ty, self.name, self.value)
    }
}

/// Заголовок пользовательской функции, зарегистрированный до разбора тела,
/// с однократной привязкой к узлу объявления.
#[derive(Debug, Clone, PartialEq)]
pub struct PreDefinedFunctionSignature {
    signature: FunctionSignature,
    definition: Option<NodeId>,
}

impl PreDefinedFunctionSignature {
    pub fn new(signature: FunctionSignature) -> Self { Self { signature, definition: None } }
    pub fn signature(&self) -> &FunctionSignature { &self.signature }
    pub fn name(&self) -> &str { &self.signature.name }
    pub fn return_type(&self) -> LslType { self.signature.return_type }
    pub fn definition(&self) -> Option<NodeId> { self.definition }

    /// Привязать узел объявления. Повторная привязка того же узла ничего не меняет,
    /// привязка другого узла отклоняется.
    pub fn bind_definition(&mut self, node: NodeId) -> ContractResult<()> {
        match self.definition {
            Some(existing) if existing != node => Err(ContractError::DefinitionAlreadyBound {
                name: self.signature.name.clone(),
                existing,
                requested: node,
            }),
            _ => {
                self.definition = Some(node);
                Ok(())
            }
        }
    }
}

/// Идентификатор заранее объявленной сигнатуры в таблице дерева.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(ret: LslType, name: &str, params: &[(LslType, &str)]) -> FunctionSignature {
        FunctionSignature::new(ret, name, params.iter().map(|(t, n)| Parameter::new(*t, *n)).collect())
    }

    #[test]
    fn equality_ignores_parameter_names() {
        let a = sig(LslType::Integer, "f", &[(LslType::Integer, "a"), (LslType::String, "b")]);
        let b = sig(LslType::Integer, "f", &[(LslType::Integer, "x"), (LslType::String, "y")]);
        let c = sig(LslType::Void, "f", &[(LslType::Integer, "a"), (LslType::String, "b")]);
        assert!(signature_matches(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_round_trip_format() {
        let s = sig(LslType::Integer, "llAbs", &[(LslType::Integer, "val")]);
        assert_eq!(s.to_string(), "integer llAbs(integer val)");
        let v = sig(LslType::Void, "llResetScript", &[]);
        assert_eq!(v.to_string(), "llResetScript()");
    }

    #[test]
    fn check_arguments_with_variadic_tail() {
        let mut s = sig(LslType::String, "osFormatString", &[(LslType::String, "fmt")]);
        s.parameters.push(Parameter::variadic(LslType::Void, "values"));
        assert!(s.check_arguments(&[LslType::String]).is_ok());
        assert!(s.check_arguments(&[LslType::String, LslType::Integer, LslType::Vector]).is_ok());
        assert_eq!(s.check_arguments(&[]), Err(usize::MAX));
        assert_eq!(s.check_arguments(&[LslType::Vector]), Err(0));
    }

    #[test]
    fn implicit_conversions() {
        assert!(LslType::Float.is_assignable_from(LslType::Integer));
        assert!(!LslType::Integer.is_assignable_from(LslType::Float));
        assert!(LslType::Key.is_assignable_from(LslType::String));
        assert!(LslType::Integer.is_castable_from(LslType::Float));
        assert!(!LslType::Vector.is_castable_from(LslType::Integer));
    }

    #[test]
    fn definition_binds_once() {
        let mut p = PreDefinedFunctionSignature::new(sig(LslType::Void, "f", &[]));
        assert!(p.definition().is_none());
        p.bind_definition(NodeId(4)).unwrap();
        p.bind_definition(NodeId(4)).unwrap();
        let err = p.bind_definition(NodeId(5)).unwrap_err();
        assert!(matches!(err, ContractError::DefinitionAlreadyBound { existing: NodeId(4), requested: NodeId(5), .. }));
        assert_eq!(p.definition(), Some(NodeId(4)));
    }
}
