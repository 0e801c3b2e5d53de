//! Fixed catalog of dimensions, indicator types and the variables they cross.
//!
//! Every score column in the feature table is named
//! `{indicator-prefix}-{dimension-letter}{item}`, e.g. `d-a1` or `op-b3`.
//! Columns are addressed through [`Variable`] rather than formatted strings,
//! and one label table backs every place a variable is shown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BrujulaError;

/// Items per dimension (`a1..a5`, `b1..b5`, ...).
pub const ITEMS_PER_DIMENSION: usize = 5;
/// Total number of score columns: 4 indicator types × 5 dimensions × 5 items.
pub const VARIABLE_COUNT: usize = IndicatorType::ALL.len() * Dimension::ALL.len() * ITEMS_PER_DIMENSION;
/// Upper bound of an integer compliance score.
pub const MAX_SCORE: u8 = 4;

// ── Dimension ────────────────────────────────────────────────────────────────

/// Thematic group of five variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    HousingLand,
    Infrastructure,
    Amenities,
    Accessibility,
    LocalDevelopment,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::HousingLand,
        Dimension::Infrastructure,
        Dimension::Amenities,
        Dimension::Accessibility,
        Dimension::LocalDevelopment,
    ];

    /// Column letter shared by the dimension's items.
    pub fn letter(self) -> char {
        match self {
            Dimension::HousingLand      => 'a',
            Dimension::Infrastructure   => 'b',
            Dimension::Amenities        => 'c',
            Dimension::Accessibility    => 'd',
            Dimension::LocalDevelopment => 'e',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::HousingLand      => "VIVIENDA Y SUELO",
            Dimension::Infrastructure   => "INFRAESTRUCTURAS",
            Dimension::Amenities        => "EQUIPAMIENTOS",
            Dimension::Accessibility    => "ACCESIBILIDAD",
            Dimension::LocalDevelopment => "DESARROLLO LOCAL",
        }
    }

    /// Stable key used in URLs and JSON.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::HousingLand      => "housing-land",
            Dimension::Infrastructure   => "infrastructure",
            Dimension::Amenities        => "amenities",
            Dimension::Accessibility    => "accessibility",
            Dimension::LocalDevelopment => "local-development",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.letter() == letter)
    }

    fn ordinal(self) -> usize {
        self as usize
    }

    /// The five items of this dimension, in column order.
    pub fn items(self) -> [DimensionItem; ITEMS_PER_DIMENSION] {
        [1, 2, 3, 4, 5].map(|n| DimensionItem { dimension: self, number: n })
    }

    /// The five variables of this dimension under one indicator type.
    pub fn variables(self, indicator: IndicatorType) -> [Variable; ITEMS_PER_DIMENSION] {
        self.items().map(|item| Variable::new(indicator, item))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Indicator type ───────────────────────────────────────────────────────────

/// Evaluative lens applied to every dimension item. Each is a column prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorType {
    Rights,
    PublicWorks,
    SocialOrganization,
    Norms,
}

impl IndicatorType {
    /// Display order used by every table and chart.
    pub const ALL: [IndicatorType; 4] = [
        IndicatorType::Rights,
        IndicatorType::PublicWorks,
        IndicatorType::SocialOrganization,
        IndicatorType::Norms,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            IndicatorType::Rights             => "d",
            IndicatorType::PublicWorks        => "op",
            IndicatorType::SocialOrganization => "os",
            IndicatorType::Norms              => "n",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IndicatorType::Rights             => "Derechos",
            IndicatorType::PublicWorks        => "Obras públicas",
            IndicatorType::SocialOrganization => "Organización social",
            IndicatorType::Norms              => "Normas",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            IndicatorType::Rights             => "rights",
            IndicatorType::PublicWorks        => "public-works",
            IndicatorType::SocialOrganization => "social-organization",
            IndicatorType::Norms              => "norms",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.key() == key)
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.prefix() == prefix)
    }

    /// Position in [`IndicatorType::ALL`]; also the column index in summaries.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Items and variables ──────────────────────────────────────────────────────

/// One scored question inside a dimension, independent of indicator type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionItem {
    dimension: Dimension,
    /// 1-based, 1..=5.
    number: u8,
}

impl DimensionItem {
    pub fn dimension(self) -> Dimension {
        self.dimension
    }

    pub fn number(self) -> u8 {
        self.number
    }

    /// Column suffix, e.g. `"b3"`.
    pub fn code(self) -> String {
        format!("{}{}", self.dimension.letter(), self.number)
    }

    pub fn label(self) -> &'static str {
        ITEM_LABELS[self.dimension.ordinal()][usize::from(self.number) - 1]
    }
}

/// A score column: the cross of an indicator type and a dimension item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    indicator: IndicatorType,
    item: DimensionItem,
}

impl Variable {
    pub fn new(indicator: IndicatorType, item: DimensionItem) -> Self {
        Self { indicator, item }
    }

    pub fn indicator(self) -> IndicatorType {
        self.indicator
    }

    pub fn item(self) -> DimensionItem {
        self.item
    }

    pub fn dimension(self) -> Dimension {
        self.item.dimension
    }

    /// Column name in the feature table, e.g. `"op-b3"`.
    pub fn code(self) -> String {
        format!("{}-{}", self.indicator.prefix(), self.item.code())
    }

    /// Display label. Labels depend on the item only, so `d-a1` and `n-a1`
    /// read the same.
    pub fn label(self) -> &'static str {
        self.item.label()
    }

    /// Parse a column name such as `"os-c4"`.
    pub fn parse(code: &str) -> Option<Self> {
        let (prefix, rest) = code.split_once('-')?;
        let indicator = IndicatorType::from_prefix(prefix)?;
        let mut chars = rest.chars();
        let dimension = Dimension::from_letter(chars.next()?)?;
        let digits = chars.as_str();
        if digits.len() != 1 {
            return None;
        }
        let number: u8 = digits.parse().ok()?;
        if !(1..=ITEMS_PER_DIMENSION as u8).contains(&number) {
            return None;
        }
        Some(Self::new(indicator, DimensionItem { dimension, number }))
    }

    /// Dense index in `0..VARIABLE_COUNT`, indicator-major.
    pub fn index(self) -> usize {
        self.indicator.ordinal() * Dimension::ALL.len() * ITEMS_PER_DIMENSION
            + self.item.dimension.ordinal() * ITEMS_PER_DIMENSION
            + usize::from(self.item.number)
            - 1
    }

    /// Every variable, in [`Variable::index`] order.
    pub fn all() -> impl Iterator<Item = Variable> {
        IndicatorType::ALL.into_iter().flat_map(|indicator| {
            Dimension::ALL
                .into_iter()
                .flat_map(move |dimension| dimension.variables(indicator))
        })
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for Variable {
    type Err = BrujulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::parse(s).ok_or_else(|| BrujulaError::UnknownVariable(s.to_string()))
    }
}

impl Serialize for Variable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Variable::parse(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown variable code {code:?}")))
    }
}

// ── Labels ───────────────────────────────────────────────────────────────────

/// Display labels, `[dimension][item - 1]`.
const ITEM_LABELS: [[&str; ITEMS_PER_DIMENSION]; 5] = [
    [
        "Seguridad en la tenencia del suelo",
        "Sin hacinamiento en la vivienda",
        "Vivienda construida con materiales permanentes",
        "Vivienda con baño propio",
        "Generación de oferta de vivienda y alquiler a precios accesibles",
    ],
    [
        "Provisión de agua potable disponible",
        "Servicio sanitarios o pozos disponibles sin contaminación",
        "Disponibilidad de drenajes que eviten inundación",
        "Conexión de energía (electricidad y gas)",
        "Conexión servicios de telecomunicaciones, Internet, etc.",
    ],
    [
        "Espacios verdes públicos disponibles y mantenidos",
        "Escuelas pre-escolares, primarias y secundarias",
        "Hospitales y centros de salud de atención primaria disponibles",
        "Servicios seguridad policial, bomberos, templos y DC disponibles",
        "Servicios de alumbrado, barrido y limpieza disponibles",
    ],
    [
        "Calzadas disponibles permitiendo movimiento vehicular",
        "Aceras disponibles permitiendo circulación peatonal y ciclística con seguridad vial, iluminadas y limpias",
        "Servicio transporte público guiado disponible a precios accesibles",
        "Servicios de colectivos, taxis y motos disponibles",
        "Posibilidad de acceso de ambulancias, bomberos, policía y defensa civil",
    ],
    [
        "Seguridad alimentaria disponible",
        "Disponibilidad de trabajo, ingresos, medios de sustento y previsión social",
        "Capacidad de ahorro y re-inversión en mejoras de la vivienda y el barrio",
        "Tolerancia y aceptación entre grupos sociales diferentes",
        "Acciones de prevención y reducción de riesgos de contaminación y desastres vigentes",
    ],
];
