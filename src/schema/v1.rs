//! EcoSpold 1 schema tables
//!
//! Element types of the EcoSpold01 dataset format. A document holds one or
//! more `dataset`s, each split into `metaInformation` and `flowData`.

use super::{ChoiceGroup, ElementType, FieldDescriptor as F, Generation, Schema};
use crate::coercion::{CodeTable, SemanticType as T};

/// EcoSpold 1 namespace
pub const NAMESPACE: &str = "http://www.EcoInvent.org/EcoSpold01";

// =============================================================================
// Code tables
// =============================================================================

/// Kind of input flow
pub static INPUT_GROUPS: CodeTable = CodeTable {
    name: "inputGroup",
    entries: &[
        (1, "Materials/Fuels"),
        (2, "Electricity/Heat"),
        (3, "Services"),
        (4, "FromNature"),
        (5, "FromTechnosphere"),
    ],
};

/// Kind of output flow
pub static OUTPUT_GROUPS: CodeTable = CodeTable {
    name: "outputGroup",
    entries: &[
        (0, "ReferenceProduct"),
        (1, "Include avoided product system"),
        (2, "Allocated by product"),
        (3, "WasteToTreatment"),
        (4, "ToNature"),
    ],
};

/// Uncertainty distribution of an exchange
pub static UNCERTAINTY_TYPE: CodeTable = CodeTable {
    name: "uncertaintyType",
    entries: &[
        (0, "undefined"),
        (1, "lognormal"),
        (2, "normal"),
        (3, "triang"),
        (4, "uniform"),
    ],
};

/// Allocation parameter
pub static ALLOCATION_METHOD: CodeTable = CodeTable {
    name: "allocationMethod",
    entries: &[
        (-1, "Undefined"),
        (0, "Physical causality"),
        (1, "Economic causality"),
        (2, "Othermethod"),
    ],
};

/// Kind of dataset
pub static DATASET_TYPE: CodeTable = CodeTable {
    name: "type",
    entries: &[
        (0, "System non-terminated"),
        (1, "Unit process"),
        (2, "System terminated"),
        (3, "Elementary Flow"),
        (4, "Impact Category"),
        (5, "Multioutput process"),
    ],
};

/// How energy values are applied
pub static ENERGY_VALUES: CodeTable = CodeTable {
    name: "energyValues",
    entries: &[(0, "Undefined"), (1, "Net values"), (2, "Gross values")],
};

/// Kind of publication
pub static SOURCE_TYPE: CodeTable = CodeTable {
    name: "sourceType",
    entries: &[
        (0, "Undefined (default)"),
        (1, "Article"),
        (2, "Chapters in anthology"),
        (3, "Seperate publication"),
        (4, "Measurement on site"),
        (5, "Oral communication"),
        (6, "Personal written communication"),
        (7, "Questionnaries"),
    ],
};

/// Publication status of the data
pub static DATA_PUBLISHED_IN: CodeTable = CodeTable {
    name: "dataPublishedIn",
    entries: &[
        (0, "Data as such notpublished (default)"),
        (1, "The data of some unit processes or subsystems are published"),
        (2, "Data has been published entirely in 'referenceToPublishedSource'"),
    ],
};

/// Access restriction
pub static ACCESS_RESTRICTED_TO: CodeTable = CodeTable {
    name: "accessRestrictedTo",
    entries: &[
        (0, "Public"),
        (1, "ETH Domain"),
        (2, "ecoinvent 2000"),
        (3, "Institute"),
    ],
};

// =============================================================================
// Element types
// =============================================================================

const CATEGORY: T = T::max_len(40);
const NAME: T = T::max_len(80);
const LOCATION: T = T::max_len(7);
const UNIT: T = T::max_len(10);
const COUNTRY: T = T::exact_len(2);
const YEAR_MONTH: T = T::exact_len(7);

static ELEMENT_TYPES: &[ElementType] = &[
    ElementType {
        name: "EcoSpold",
        fields: &[
            F::attribute("validationId", T::INT),
            F::attribute("validationStatus", T::TEXT),
            F::children("dataset", "Dataset"),
        ],
        choices: &[],
    },
    ElementType {
        name: "Dataset",
        fields: &[
            F::attribute("number", T::INT).required(),
            F::attribute("internalSchemaVersion", T::TEXT),
            F::attribute("generator", T::TEXT),
            F::attribute("timestamp", T::DateTime),
            F::attribute("validCompanyCodes", T::TEXT),
            F::attribute("validRegionalCodes", T::TEXT),
            F::attribute("validCategories", T::TEXT),
            F::attribute("validUnits", T::TEXT),
            F::child("metaInformation", "MetaInformation").required(),
            F::child("flowData", "FlowData").required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "MetaInformation",
        fields: &[
            F::child("processInformation", "ProcessInformation").required(),
            F::child("modellingAndValidation", "ModellingAndValidation"),
            F::child("administrativeInformation", "AdministrativeInformation"),
        ],
        choices: &[],
    },
    ElementType {
        name: "ProcessInformation",
        fields: &[
            F::child("referenceFunction", "ReferenceFunction").required(),
            F::child("geography", "Geography"),
            F::child("technology", "Technology"),
            F::child("dataSetInformation", "DataSetInformation").required(),
            F::child("timePeriod", "TimePeriod"),
        ],
        choices: &[],
    },
    ElementType {
        name: "ModellingAndValidation",
        fields: &[
            F::child("representativeness", "Representativeness"),
            F::children("source", "Source"),
            F::child("validation", "Validation"),
        ],
        choices: &[],
    },
    ElementType {
        name: "AdministrativeInformation",
        fields: &[
            F::child("dataEntryBy", "DataEntryBy"),
            F::child("dataGeneratorAndPublication", "DataGeneratorAndPublication"),
            F::children("person", "Person"),
        ],
        choices: &[],
    },
    ElementType {
        name: "FlowData",
        fields: &[
            F::children("exchange", "Exchange"),
            F::children("allocation", "Allocation"),
        ],
        choices: &[],
    },
    ElementType {
        name: "Exchange",
        fields: &[
            F::attribute("number", T::INT).required(),
            F::attribute("category", CATEGORY),
            F::attribute("subCategory", CATEGORY),
            F::attribute("localCategory", CATEGORY),
            F::attribute("localSubCategory", CATEGORY),
            F::attribute("CASNumber", T::RegistryCode),
            F::attribute("name", NAME).required(),
            F::attribute("location", LOCATION),
            F::attribute("unit", UNIT).required(),
            F::attribute("meanValue", T::Float).required(),
            F::attribute("uncertaintyType", T::Code(&UNCERTAINTY_TYPE)),
            F::attribute("standardDeviation95", T::Float),
            F::attribute("formula", T::max_len(40)),
            F::attribute("referenceToSource", T::NUMBER_REF),
            F::attribute("pageNumbers", T::max_len(30)),
            F::attribute("generalComment", T::max_len(32000)),
            F::attribute("localName", NAME),
            F::attribute("infrastructureProcess", T::Boolean),
            F::attribute("minValue", T::Float),
            F::attribute("maxValue", T::Float),
            F::attribute("mostLikelyValue", T::Float),
            F::text_list("inputGroup", T::Code(&INPUT_GROUPS)).in_choice("groups"),
            F::text_list("outputGroup", T::Code(&OUTPUT_GROUPS)).in_choice("groups"),
        ],
        choices: &[ChoiceGroup {
            id: "groups",
            members: &["inputGroup", "outputGroup"],
        }],
    },
    ElementType {
        name: "Allocation",
        fields: &[
            F::attribute("referenceToCoProduct", T::NUMBER_REF).required(),
            F::attribute("allocationMethod", T::Code(&ALLOCATION_METHOD)),
            F::attribute("fraction", T::Float).required(),
            F::attribute("explanations", T::TEXT),
            F::text_list("referenceToInputOutput", T::NUMBER_REF),
        ],
        choices: &[],
    },
    ElementType {
        name: "ReferenceFunction",
        fields: &[
            F::attribute("datasetRelatesToProduct", T::Boolean),
            F::attribute("name", NAME).required(),
            F::attribute("localName", NAME),
            F::attribute("infrastructureProcess", T::Boolean),
            F::attribute("amount", T::Float).required(),
            F::attribute("unit", UNIT).required(),
            F::attribute("category", CATEGORY),
            F::attribute("subCategory", CATEGORY),
            F::attribute("localCategory", CATEGORY),
            F::attribute("localSubCategory", CATEGORY),
            F::attribute("includedProcesses", T::max_len(32000)),
            F::attribute("generalComment", T::max_len(32000)),
            F::attribute("infrastructureIncluded", T::Boolean),
            F::attribute("CASNumber", T::RegistryCode),
            F::attribute("statisticalClassification", T::TEXT),
            F::attribute("formula", T::max_len(40)),
            F::text_list("synonym", NAME),
        ],
        choices: &[],
    },
    ElementType {
        name: "Geography",
        fields: &[
            F::attribute("location", LOCATION).required(),
            F::attribute("text", T::max_len(32000)),
        ],
        choices: &[],
    },
    ElementType {
        name: "Technology",
        fields: &[F::attribute("text", T::max_len(32000))],
        choices: &[],
    },
    ElementType {
        name: "DataSetInformation",
        fields: &[
            F::attribute("type", T::Code(&DATASET_TYPE)).required(),
            F::attribute("impactAssessmentResult", T::Boolean).required(),
            F::attribute("timestamp", T::DateTime).required(),
            F::attribute("version", T::Float).required(),
            F::attribute("internalVersion", T::Float).required(),
            F::attribute("energyValues", T::Code(&ENERGY_VALUES)).with_default("0"),
            F::attribute("languageCode", COUNTRY).with_default("en"),
            F::attribute("localLanguageCode", COUNTRY).with_default("de"),
        ],
        choices: &[],
    },
    ElementType {
        name: "TimePeriod",
        fields: &[
            F::attribute("dataValidForEntirePeriod", T::Boolean).required(),
            F::attribute("text", T::max_len(32000)),
            F::text("startYear", T::INT).in_choice("start"),
            F::text("startYearMonth", YEAR_MONTH).in_choice("start"),
            F::text("startDate", T::Date).in_choice("start"),
            F::text("endYear", T::INT).in_choice("end"),
            F::text("endYearMonth", YEAR_MONTH).in_choice("end"),
            F::text("endDate", T::Date).in_choice("end"),
        ],
        choices: &[
            ChoiceGroup {
                id: "start",
                members: &["startYear", "startYearMonth", "startDate"],
            },
            ChoiceGroup {
                id: "end",
                members: &["endYear", "endYearMonth", "endDate"],
            },
        ],
    },
    ElementType {
        name: "Representativeness",
        fields: &[
            F::attribute("percent", T::Float),
            F::attribute("productionVolume", T::TEXT),
            F::attribute("samplingProcedure", T::TEXT),
            F::attribute("extrapolations", T::TEXT),
            F::attribute("uncertaintyAdjustments", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "Source",
        fields: &[
            F::attribute("number", T::INT).required(),
            F::attribute("sourceType", T::Code(&SOURCE_TYPE)).with_default("0"),
            F::attribute("firstAuthor", T::max_len(40)).required(),
            F::attribute("additionalAuthors", T::max_len(255)),
            F::attribute("year", T::INT),
            F::attribute("title", T::max_len(32000)).required(),
            F::attribute("pageNumbers", T::max_len(15)),
            F::attribute("nameOfEditors", T::max_len(40)),
            F::attribute("titleOfAnthology", T::TEXT),
            F::attribute("placeOfPublications", T::max_len(40)),
            F::attribute("publisher", T::max_len(40)),
            F::attribute("journal", T::max_len(40)),
            F::attribute("volumeNo", T::INT),
            F::attribute("issueNo", T::max_len(40)),
            F::attribute("text", T::max_len(32000)),
        ],
        choices: &[],
    },
    ElementType {
        name: "Validation",
        fields: &[
            F::attribute("proofReadingDetails", T::max_len(32000)).required(),
            F::attribute("proofReadingValidator", T::NUMBER_REF).required(),
            F::attribute("otherDetails", T::max_len(32000)),
        ],
        choices: &[],
    },
    ElementType {
        name: "DataEntryBy",
        fields: &[
            F::attribute("person", T::NUMBER_REF).required(),
            F::attribute("qualityNetwork", T::INT),
        ],
        choices: &[],
    },
    ElementType {
        name: "DataGeneratorAndPublication",
        fields: &[
            F::attribute("person", T::NUMBER_REF).required(),
            F::attribute("dataPublishedIn", T::Code(&DATA_PUBLISHED_IN)).with_default("0"),
            F::attribute("referenceToPublishedSource", T::NUMBER_REF),
            F::attribute("copyright", T::Boolean),
            F::attribute("accessRestrictedTo", T::Code(&ACCESS_RESTRICTED_TO)),
            F::attribute("companyCode", LOCATION),
            F::attribute("countryCode", COUNTRY),
            F::attribute("pageNumbers", T::max_len(15)),
        ],
        choices: &[],
    },
    ElementType {
        name: "Person",
        fields: &[
            F::attribute("number", T::INT).required(),
            F::attribute("name", T::max_len(40)).required(),
            F::attribute("address", T::max_len(255)),
            F::attribute("telephone", T::max_len(40)),
            F::attribute("telefax", T::max_len(40)),
            F::attribute("email", T::max_len(80)),
            F::attribute("companyCode", LOCATION),
            F::attribute("countryCode", COUNTRY),
        ],
        choices: &[],
    },
];

/// Compiled EcoSpold 1 schema
pub static SCHEMA: Schema = Schema {
    generation: Generation::V1,
    namespace: NAMESPACE,
    root_tag: "ecoSpold",
    root_type: "EcoSpold",
    types: ELEMENT_TYPES,
};
