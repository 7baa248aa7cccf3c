//! EcoSpold 2 schema tables
//!
//! Element types of the EcoSpold02 activity dataset format. A document holds
//! exactly one `activityDataset` or `childActivityDataset`.

use super::{ChoiceGroup, ElementType, FieldDescriptor as F, Generation, Schema};
use crate::coercion::{CodeTable, SemanticType as T};

/// EcoSpold 2 namespace
pub const NAMESPACE: &str = "http://www.EcoInvent.org/EcoSpold02";

// =============================================================================
// Code tables
// =============================================================================

/// Relation of a child dataset to its parent
pub static INHERITANCE_DEPTH: CodeTable = CodeTable {
    name: "inheritanceDepth",
    entries: &[
        (0, "not a child"),
        (1, "a geography child"),
        (2, "a temporal child"),
        (3, "a macro-economic scenario child"),
    ],
};

/// Kind of activity dataset
pub static ACTIVITY_TYPE: CodeTable = CodeTable {
    name: "type",
    entries: &[(1, "Unit process"), (2, "System terminated")],
};

/// Special activity classification
pub static SPECIAL_ACTIVITY_TYPE: CodeTable = CodeTable {
    name: "specialActivityType",
    entries: &[
        (0, "ordinary transforming activity (default)"),
        (1, "market activity"),
        (2, "IO activity"),
        (3, "Residual activity"),
        (4, "production mix"),
        (5, "import activity"),
        (6, "supply mix"),
        (7, "export activity"),
        (8, "re-export activity"),
        (9, "correction activity"),
        (10, "market group"),
    ],
};

/// How energy values are applied
pub static ENERGY_VALUES: CodeTable = CodeTable {
    name: "energyValues",
    entries: &[
        (0, "Undefined (default)"),
        (1, "Net values"),
        (2, "Gross values"),
    ],
};

/// Technology classification
pub static TECHNOLOGY_LEVEL: CodeTable = CodeTable {
    name: "technologyLevel",
    entries: &[
        (0, "undefined"),
        (1, "New"),
        (2, "Modern"),
        (3, "Current (default)"),
        (4, "Old"),
        (5, "Outdated"),
    ],
};

/// Direction of an elementary input
pub static ELEMENTARY_INPUT_GROUP: CodeTable = CodeTable {
    name: "inputGroup",
    entries: &[(4, "FromEnvironment")],
};

/// Direction of an elementary output
pub static ELEMENTARY_OUTPUT_GROUP: CodeTable = CodeTable {
    name: "outputGroup",
    entries: &[(4, "ToEnvironment")],
};

/// Kind of intermediate input
pub static INTERMEDIATE_INPUT_GROUP: CodeTable = CodeTable {
    name: "inputGroup",
    entries: &[
        (1, "Materials/Fuels"),
        (2, "Electricity/Heat"),
        (3, "Services"),
        (5, "FromTechnosphere"),
    ],
};

/// Kind of intermediate output
pub static INTERMEDIATE_OUTPUT_GROUP: CodeTable = CodeTable {
    name: "outputGroup",
    entries: &[
        (0, "ReferenceProduct"),
        (2, "By-product"),
        (3, "MaterialForTreatment"),
    ],
};

/// Publication status of the data
pub static DATA_PUBLISHED_IN: CodeTable = CodeTable {
    name: "dataPublishedIn",
    entries: &[
        (0, "Data as such not published (default)."),
        (1, "The data of some unit processes or subsystems are published."),
        (2, "Data has been published entirely in 'referenceToPublishedSource'."),
    ],
};

/// Access restriction
pub static ACCESS_RESTRICTED_TO: CodeTable = CodeTable {
    name: "accessRestrictedTo",
    entries: &[
        (0, "Public"),
        (1, "Licensees"),
        (2, "Results only"),
        (3, "Restricted"),
    ],
};

/// Pedigree reliability score
pub static RELIABILITY: CodeTable = CodeTable {
    name: "reliability",
    entries: &[
        (1, "Verified data based on measurements"),
        (
            2,
            "Verified data partly based on assumptions OR nonverified data based on measurements",
        ),
        (3, "Non-verified data partly based on qualified estimates"),
        (4, "Qualified estimate (e.g. by industrial expert)"),
        (5, "Non-qualified estimate (default)"),
    ],
};

/// Pedigree completeness score
pub static COMPLETENESS: CodeTable = CodeTable {
    name: "completeness",
    entries: &[
        (
            1,
            "Representative data from all sites relevant for the market considered over an adequate period to even out normal fluctuations",
        ),
        (
            2,
            "Representative data from >50% of the sites relevant for the market considered over an adequate period to even out normal fluctuations",
        ),
        (
            3,
            "Representative data from only some sites (<<50%) relevant for the market considered OR >50% of sites but from shorter periods",
        ),
        (
            4,
            "Representative data from only one site relevant for the market considered OR some sites but from shorter periods",
        ),
        (
            5,
            "Representativeness unknown or data from a small number of sites AND from shorter periods",
        ),
    ],
};

/// Pedigree temporal correlation score
pub static TEMPORAL_CORRELATION: CodeTable = CodeTable {
    name: "temporalCorrelation",
    entries: &[
        (1, "Less than 3 years of difference to the time period of the dataset"),
        (2, "Less than 6 years of difference to the time period of the dataset"),
        (3, "Less than 10 years of difference to the time period of the dataset"),
        (4, "Less than 15 years of difference to the time period of the dataset"),
        (
            5,
            "Age of data unknown or more than 15 years of difference to the time period of the dataset",
        ),
    ],
};

/// Pedigree geographical correlation score
pub static GEOGRAPHICAL_CORRELATION: CodeTable = CodeTable {
    name: "geographicalCorrelation",
    entries: &[
        (1, "Data from area under study"),
        (2, "Average data from larger area in which the area under study is included"),
        (3, "Data from area with similar production conditions"),
        (4, "Data from area with slightly similar production conditions"),
        (5, "Data from unknown OR distinctly different area"),
    ],
};

/// Pedigree further technology correlation score
pub static FURTHER_TECHNOLOGY_CORRELATION: CodeTable = CodeTable {
    name: "furtherTechnologyCorrelation",
    entries: &[
        (1, "Data from enterprises, processes and materials under study"),
        (
            2,
            "Data from processes and materials under study (i.e. identical technology) but from different enterprises",
        ),
        (
            3,
            "Data from processes and materials under study but from different technology",
        ),
        (4, "Data on related processes or materials"),
        (5, "Data on related processes on laboratory scale or from different technology"),
    ],
};

// =============================================================================
// Element types
// =============================================================================

const NAME: T = T::max_len(120);
const UNIT_NAME: T = T::max_len(40);
const VARIABLE: T = T::max_len(40);
const SOURCE_YEAR: T = T::max_len(30);
const FIRST_AUTHOR: T = T::max_len(40);
const UNCERTAINTY_GROUP: &[ChoiceGroup] = &[ChoiceGroup {
    id: "distribution",
    members: &[
        "lognormal",
        "normal",
        "triangular",
        "uniform",
        "beta",
        "gamma",
        "binomial",
        "undefined",
    ],
}];

static ELEMENT_TYPES: &[ElementType] = &[
    ElementType {
        name: "EcoSpold",
        fields: &[
            F::child("activityDataset", "ActivityDataset").in_choice("dataset"),
            F::child("childActivityDataset", "ActivityDataset").in_choice("dataset"),
        ],
        choices: &[ChoiceGroup {
            id: "dataset",
            members: &["activityDataset", "childActivityDataset"],
        }],
    },
    ElementType {
        name: "ActivityDataset",
        fields: &[
            F::child("activityDescription", "ActivityDescription").required(),
            F::child("flowData", "FlowData").required(),
            F::child("modellingAndValidation", "ModellingAndValidation"),
            F::child("administrativeInformation", "AdministrativeInformation"),
        ],
        choices: &[],
    },
    ElementType {
        name: "ActivityDescription",
        fields: &[
            F::child("activity", "Activity").required(),
            F::children("classification", "Classification"),
            F::child("geography", "Geography"),
            F::child("technology", "Technology"),
            F::child("timePeriod", "TimePeriod"),
            F::child("macroEconomicScenario", "MacroEconomicScenario"),
        ],
        choices: &[],
    },
    ElementType {
        name: "Activity",
        fields: &[
            F::attribute("id", T::UUID).required(),
            F::attribute("activityNameId", T::UUID).required(),
            F::attribute("activityNameContextId", T::UUID),
            F::attribute("parentActivityId", T::UUID),
            F::attribute("parentActivityContextId", T::UUID),
            F::attribute("inheritanceDepth", T::Code(&INHERITANCE_DEPTH)).with_default("0"),
            F::attribute("type", T::Code(&ACTIVITY_TYPE)).required(),
            F::attribute("specialActivityType", T::Code(&SPECIAL_ACTIVITY_TYPE))
                .with_default("0"),
            F::attribute("energyValues", T::Code(&ENERGY_VALUES)).with_default("0"),
            F::attribute("masterAllocationPropertyId", T::UUID),
            F::attribute("masterAllocationPropertyIdOverwrittenByChild", T::Boolean),
            F::attribute("masterAllocationPropertyContextId", T::UUID),
            F::attribute("datasetIcon", T::TEXT),
            F::text_list("activityName", NAME),
            F::text_list("synonym", T::max_len(80)),
            F::text_list("includedActivitiesStart", T::TEXT),
            F::text_list("includedActivitiesEnd", T::TEXT),
            F::child("allocationComment", "TextAndImage"),
            F::child("generalComment", "TextAndImage"),
            F::text_list("tag", T::max_len(40)),
        ],
        choices: &[],
    },
    ElementType {
        name: "Classification",
        fields: &[
            F::attribute("classificationId", T::UUID).required(),
            F::attribute("classificationContextId", T::UUID),
            F::text_list("classificationSystem", T::max_len(255)),
            F::text_list("classificationValue", T::max_len(255)),
        ],
        choices: &[],
    },
    ElementType {
        name: "Geography",
        fields: &[
            F::attribute("geographyId", T::UUID).required(),
            F::attribute("geographyContextId", T::UUID),
            F::text_list("shortname", T::max_len(40)),
            F::child("comment", "TextAndImage"),
        ],
        choices: &[],
    },
    ElementType {
        name: "Technology",
        fields: &[
            F::attribute("technologyLevel", T::Code(&TECHNOLOGY_LEVEL)).with_default("3"),
            F::child("comment", "TextAndImage"),
        ],
        choices: &[],
    },
    ElementType {
        name: "TimePeriod",
        fields: &[
            F::attribute("startDate", T::Date).required(),
            F::attribute("endDate", T::Date).required(),
            F::attribute("isDataValidForEntirePeriod", T::Boolean).required(),
            F::child("comment", "TextAndImage"),
        ],
        choices: &[],
    },
    ElementType {
        name: "MacroEconomicScenario",
        fields: &[
            F::attribute("macroEconomicScenarioId", T::UUID).required(),
            F::attribute("macroEconomicScenarioContextId", T::UUID),
            F::text_list("name", T::max_len(80)),
            F::text_list("comment", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "FlowData",
        fields: &[
            F::children("intermediateExchange", "IntermediateExchange"),
            F::children("elementaryExchange", "ElementaryExchange"),
            F::children("parameter", "Parameter"),
            F::children("impactIndicator", "ImpactIndicator"),
        ],
        choices: &[],
    },
    ElementType {
        name: "IntermediateExchange",
        fields: &[
            F::attribute("id", T::UUID).required(),
            F::attribute("unitId", T::UUID).required(),
            F::attribute("unitContextId", T::UUID),
            F::attribute("variableName", VARIABLE),
            F::attribute("casNumber", T::RegistryCode),
            F::attribute("amount", T::Float).required(),
            F::attribute("isCalculatedAmount", T::Boolean),
            F::attribute("mathematicalRelation", T::TEXT),
            F::attribute("sourceId", T::UUID),
            F::attribute("sourceIdOverwrittenByChild", T::Boolean),
            F::attribute("sourceContextId", T::UUID),
            F::attribute("sourceYear", SOURCE_YEAR),
            F::attribute("sourceFirstAuthor", FIRST_AUTHOR),
            F::attribute("pageNumbers", T::max_len(30)),
            F::attribute("specificAllocationPropertyId", T::UUID),
            F::attribute("specificAllocationPropertyIdOverwrittenByChild", T::Boolean),
            F::attribute("specificAllocationPropertyContextId", T::UUID),
            F::attribute("intermediateExchangeId", T::UUID).required(),
            F::attribute("intermediateExchangeContextId", T::UUID),
            F::attribute("activityLinkId", T::UUID),
            F::attribute("activityLinkIdOverwrittenByChild", T::Boolean),
            F::attribute("activityLinkContextId", T::UUID),
            F::attribute("productionVolumeAmount", T::Float),
            F::attribute("productionVolumeVariableName", VARIABLE),
            F::attribute("productionVolumeMathematicalRelation", T::TEXT),
            F::attribute("productionVolumeSourceId", T::UUID),
            F::attribute("productionVolumeSourceIdOverwrittenByChild", T::Boolean),
            F::attribute("productionVolumeSourceContextId", T::UUID),
            F::attribute("productionVolumeSourceYear", SOURCE_YEAR),
            F::attribute("productionVolumeSourceFirstAuthor", FIRST_AUTHOR),
            F::text_list("name", NAME),
            F::text_list("unitName", UNIT_NAME),
            F::text_list("comment", T::TEXT),
            F::children("uncertainty", "Uncertainty"),
            F::children("property", "Property"),
            F::children("transferCoefficient", "TransferCoefficient"),
            F::text_list("synonym", T::max_len(80)),
            F::text_list("tag", T::max_len(40)),
            F::children("productionVolumeUncertainty", "Uncertainty"),
            F::text_list("productionVolumeComment", T::TEXT),
            F::children("classification", "Classification"),
            F::text("inputGroup", T::Code(&INTERMEDIATE_INPUT_GROUP)).in_choice("group"),
            F::text("outputGroup", T::Code(&INTERMEDIATE_OUTPUT_GROUP)).in_choice("group"),
        ],
        choices: &[ChoiceGroup {
            id: "group",
            members: &["inputGroup", "outputGroup"],
        }],
    },
    ElementType {
        name: "ElementaryExchange",
        fields: &[
            F::attribute("id", T::UUID).required(),
            F::attribute("unitId", T::UUID).required(),
            F::attribute("unitContextId", T::UUID),
            F::attribute("variableName", VARIABLE),
            F::attribute("casNumber", T::RegistryCode),
            F::attribute("amount", T::Float).required(),
            F::attribute("isCalculatedAmount", T::Boolean),
            F::attribute("mathematicalRelation", T::TEXT),
            F::attribute("sourceId", T::UUID),
            F::attribute("sourceIdOverwrittenByChild", T::Boolean),
            F::attribute("sourceContextId", T::UUID),
            F::attribute("sourceYear", SOURCE_YEAR),
            F::attribute("sourceFirstAuthor", FIRST_AUTHOR),
            F::attribute("pageNumbers", T::max_len(30)),
            F::attribute("specificAllocationPropertyId", T::UUID),
            F::attribute("specificAllocationPropertyIdOverwrittenByChild", T::Boolean),
            F::attribute("specificAllocationPropertyContextId", T::UUID),
            F::attribute("elementaryExchangeId", T::UUID).required(),
            F::attribute("elementaryExchangeContextId", T::UUID),
            F::attribute("formula", T::max_len(40)),
            F::text_list("name", NAME),
            F::text_list("unitName", UNIT_NAME),
            F::text_list("comment", T::TEXT),
            F::children("uncertainty", "Uncertainty"),
            F::children("property", "Property"),
            F::children("transferCoefficient", "TransferCoefficient"),
            F::text_list("synonym", T::max_len(80)),
            F::text_list("tag", T::max_len(40)),
            F::child("compartment", "Compartment"),
            F::text("inputGroup", T::Code(&ELEMENTARY_INPUT_GROUP)).in_choice("group"),
            F::text("outputGroup", T::Code(&ELEMENTARY_OUTPUT_GROUP)).in_choice("group"),
        ],
        choices: &[ChoiceGroup {
            id: "group",
            members: &["inputGroup", "outputGroup"],
        }],
    },
    ElementType {
        name: "Uncertainty",
        fields: &[
            F::child("lognormal", "Lognormal").in_choice("distribution"),
            F::child("normal", "Normal").in_choice("distribution"),
            F::child("triangular", "Triangular").in_choice("distribution"),
            F::child("uniform", "Uniform").in_choice("distribution"),
            F::child("beta", "Beta").in_choice("distribution"),
            F::child("gamma", "Gamma").in_choice("distribution"),
            F::child("binomial", "Binomial").in_choice("distribution"),
            F::child("undefined", "Undefined").in_choice("distribution"),
            F::child("pedigreeMatrix", "PedigreeMatrix"),
            F::text("comment", T::TEXT),
        ],
        choices: UNCERTAINTY_GROUP,
    },
    ElementType {
        name: "Lognormal",
        fields: &[
            F::attribute("meanValue", T::Float).required(),
            F::attribute("mu", T::Float).required(),
            F::attribute("variance", T::Float).required(),
            F::attribute("varianceWithPedigreeUncertainty", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Normal",
        fields: &[
            F::attribute("meanValue", T::Float).required(),
            F::attribute("variance", T::Float).required(),
            F::attribute("varianceWithPedigreeUncertainty", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Triangular",
        fields: &[
            F::attribute("minValue", T::Float).required(),
            F::attribute("mostLikelyValue", T::Float).required(),
            F::attribute("maxValue", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Uniform",
        fields: &[
            F::attribute("minValue", T::Float).required(),
            F::attribute("maxValue", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Beta",
        fields: &[
            F::attribute("minValue", T::Float).required(),
            F::attribute("mostFrequentValue", T::Float).required(),
            F::attribute("maxValue", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Gamma",
        fields: &[
            F::attribute("shape", T::Float).required(),
            F::attribute("scale", T::Float).required(),
            F::attribute("minValue", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Binomial",
        fields: &[
            F::attribute("n", T::Integer { min: Some(0), max: None }).required(),
            F::attribute("p", T::Float).required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Undefined",
        fields: &[
            F::attribute("minValue", T::Float),
            F::attribute("maxValue", T::Float),
            F::attribute("standardDeviation95", T::Float),
        ],
        choices: &[],
    },
    ElementType {
        name: "PedigreeMatrix",
        fields: &[
            F::attribute("reliability", T::Code(&RELIABILITY)).required(),
            F::attribute("completeness", T::Code(&COMPLETENESS)).required(),
            F::attribute("temporalCorrelation", T::Code(&TEMPORAL_CORRELATION)).required(),
            F::attribute("geographicalCorrelation", T::Code(&GEOGRAPHICAL_CORRELATION))
                .required(),
            F::attribute(
                "furtherTechnologyCorrelation",
                T::Code(&FURTHER_TECHNOLOGY_CORRELATION),
            )
            .required(),
        ],
        choices: &[],
    },
    ElementType {
        name: "Property",
        fields: &[
            F::attribute("propertyId", T::UUID).required(),
            F::attribute("propertyContextId", T::UUID),
            F::attribute("variableName", VARIABLE),
            F::attribute("amount", T::Float).required(),
            F::attribute("isDefiningValue", T::Boolean),
            F::attribute("mathematicalRelation", T::TEXT),
            F::attribute("isCalculatedAmount", T::Boolean),
            F::attribute("unitId", T::UUID),
            F::attribute("unitContextId", T::UUID),
            F::attribute("sourceId", T::UUID),
            F::attribute("sourceIdOverwrittenByChild", T::Boolean),
            F::attribute("sourceContextId", T::UUID),
            F::attribute("sourceYear", SOURCE_YEAR),
            F::attribute("sourceFirstAuthor", FIRST_AUTHOR),
            F::text_list("name", NAME),
            F::text_list("unitName", UNIT_NAME),
            F::text_list("comment", T::TEXT),
            F::children("uncertainty", "Uncertainty"),
        ],
        choices: &[],
    },
    ElementType {
        name: "TransferCoefficient",
        fields: &[
            F::attribute("exchangeId", T::UUID).required(),
            F::attribute("amount", T::Float).required(),
            F::attribute("mathematicalRelation", T::TEXT),
            F::attribute("isCalculatedAmount", T::Boolean),
            F::attribute("sourceId", T::UUID),
            F::attribute("sourceIdOverwrittenByChild", T::Boolean),
            F::attribute("sourceContextId", T::UUID),
            F::attribute("sourceYear", SOURCE_YEAR),
            F::attribute("sourceFirstAuthor", FIRST_AUTHOR),
            F::children("uncertainty", "Uncertainty"),
            F::text_list("comment", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "Parameter",
        fields: &[
            F::attribute("parameterId", T::UUID).required(),
            F::attribute("parameterContextId", T::UUID),
            F::attribute("variableName", VARIABLE),
            F::attribute("mathematicalRelation", T::TEXT),
            F::attribute("isCalculatedAmount", T::Boolean),
            F::attribute("amount", T::Float).required(),
            F::attribute("unitId", T::UUID),
            F::attribute("unitContextId", T::UUID),
            F::text_list("name", NAME),
            F::text_list("unitName", UNIT_NAME),
            F::children("uncertainty", "Uncertainty"),
            F::text_list("comment", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "ImpactIndicator",
        fields: &[
            F::attribute("impactIndicatorId", T::UUID).required(),
            F::attribute("impactIndicatorContextId", T::UUID),
            F::attribute("impactMethodId", T::UUID),
            F::attribute("impactMethodContextId", T::UUID),
            F::attribute("impactCategoryId", T::UUID),
            F::attribute("impactCategoryContextId", T::UUID),
            F::attribute("amount", T::Float).required(),
            F::text_list("impactMethodName", T::max_len(120)),
            F::text_list("impactCategoryName", T::max_len(120)),
            F::text_list("name", NAME),
            F::text_list("unitName", UNIT_NAME),
        ],
        choices: &[],
    },
    ElementType {
        name: "ModellingAndValidation",
        fields: &[
            F::child("representativeness", "Representativeness"),
            F::children("review", "Review"),
        ],
        choices: &[],
    },
    ElementType {
        name: "Representativeness",
        fields: &[
            F::attribute("percent", T::Float),
            F::attribute("systemModelId", T::UUID),
            F::attribute("systemModelContextId", T::UUID),
            F::text_list("systemModelName", T::max_len(120)),
            F::text_list("samplingProcedure", T::TEXT),
            F::text_list("extrapolations", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "Review",
        fields: &[
            F::attribute("reviewerId", T::UUID).required(),
            F::attribute("reviewerContextId", T::UUID),
            F::attribute("reviewerName", T::max_len(40)).required(),
            F::attribute("reviewerEmail", T::max_len(80)).required(),
            F::attribute("reviewDate", T::Date).required(),
            F::attribute("reviewedMajorRelease", T::INT),
            F::attribute("reviewedMinorRelease", T::INT),
            F::attribute("reviewedMajorRevision", T::INT),
            F::attribute("reviewedMinorRevision", T::INT),
            F::child("details", "TextAndImage"),
            F::text_list("otherDetails", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "AdministrativeInformation",
        fields: &[
            F::child("dataEntryBy", "DataEntryBy"),
            F::child("dataGeneratorAndPublication", "DataGeneratorAndPublication"),
            F::child("fileAttributes", "FileAttributes"),
        ],
        choices: &[],
    },
    ElementType {
        name: "DataEntryBy",
        fields: &[
            F::attribute("personId", T::UUID).required(),
            F::attribute("personContextId", T::UUID),
            F::attribute("isActiveAuthor", T::Boolean),
            F::attribute("personName", T::max_len(40)),
            F::attribute("personEmail", T::max_len(80)),
        ],
        choices: &[],
    },
    ElementType {
        name: "DataGeneratorAndPublication",
        fields: &[
            F::attribute("personId", T::UUID).required(),
            F::attribute("personContextId", T::UUID),
            F::attribute("personName", T::max_len(40)),
            F::attribute("personEmail", T::max_len(80)),
            F::attribute("dataPublishedIn", T::Code(&DATA_PUBLISHED_IN)).with_default("0"),
            F::attribute("publishedSourceId", T::UUID),
            F::attribute("publishedSourceIdOverwrittenByChild", T::Boolean),
            F::attribute("publishedSourceContextId", T::UUID),
            F::attribute("publishedSourceYear", SOURCE_YEAR),
            F::attribute("publishedSourceFirstAuthor", FIRST_AUTHOR),
            F::attribute("isCopyrightProtected", T::Boolean),
            F::attribute("pageNumbers", T::max_len(30)),
            F::attribute("accessRestrictedTo", T::Code(&ACCESS_RESTRICTED_TO)),
            F::attribute("companyId", T::UUID),
            F::attribute("companyIdOverwrittenByChild", T::Boolean),
            F::attribute("companyContextId", T::UUID),
            F::attribute("companyCode", T::max_len(7)),
        ],
        choices: &[],
    },
    ElementType {
        name: "FileAttributes",
        fields: &[
            F::attribute("majorRelease", T::INT).required(),
            F::attribute("minorRelease", T::INT).required(),
            F::attribute("majorRevision", T::INT).required(),
            F::attribute("minorRevision", T::INT).required(),
            F::attribute("internalSchemaVersion", T::max_len(10)),
            F::attribute("defaultLanguage", T::max_len(2)),
            F::attribute("creationTimestamp", T::DateTime),
            F::attribute("lastEditTimestamp", T::DateTime),
            F::attribute("fileGenerator", T::TEXT),
            F::attribute("fileTimestamp", T::DateTime),
            F::attribute("contextId", T::UUID),
            F::text_list("contextName", T::max_len(80)),
            F::children("requiredContext", "RequiredContext"),
        ],
        choices: &[],
    },
    ElementType {
        name: "RequiredContext",
        fields: &[
            F::attribute("majorRelease", T::INT),
            F::attribute("minorRelease", T::INT),
            F::attribute("majorRevision", T::INT),
            F::attribute("minorRevision", T::INT),
            F::attribute("requiredContextId", T::UUID).required(),
            F::attribute("requiredContextFileLocation", T::TEXT),
            F::text_list("requiredContextName", T::max_len(80)),
        ],
        choices: &[],
    },
    ElementType {
        name: "TextAndImage",
        fields: &[
            F::text_list("text", T::TEXT),
            F::text_list("imageUri", T::TEXT),
            F::text_list("variable", T::TEXT),
        ],
        choices: &[],
    },
    ElementType {
        name: "Compartment",
        fields: &[
            F::attribute("subcompartmentId", T::UUID).required(),
            F::attribute("subcompartmentContextId", T::UUID),
            F::text_list("compartment", T::max_len(40)),
            F::text_list("subcompartment", T::max_len(40)),
        ],
        choices: &[],
    },
];

/// Compiled EcoSpold 2 schema
pub static SCHEMA: Schema = Schema {
    generation: Generation::V2,
    namespace: NAMESPACE,
    root_tag: "ecoSpold",
    root_type: "EcoSpold",
    types: ELEMENT_TYPES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_tags_share_text_and_image() {
        let activity = SCHEMA.element_type("Activity").unwrap();
        for tag in ["allocationComment", "generalComment"] {
            assert_eq!(activity.field(tag).unwrap().element_type(), Some("TextAndImage"));
        }
    }

    #[test]
    fn test_uncertainty_distributions_are_exclusive() {
        let uncertainty = SCHEMA.element_type("Uncertainty").unwrap();
        let group = uncertainty.choice("distribution").unwrap();
        assert_eq!(group.members.len(), 8);
        assert!(uncertainty.field("pedigreeMatrix").unwrap().choice.is_none());
    }

    #[test]
    fn test_dataset_choice_at_root() {
        let root = SCHEMA.root().unwrap();
        assert_eq!(root.choices[0].members, &["activityDataset", "childActivityDataset"]);
    }
}
