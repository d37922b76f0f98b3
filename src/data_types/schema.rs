use serde::Serialize;
use serde_json::{json, Map, Value};
use strum::IntoEnumIterator;

use crate::data_types::metadata::SoupType;
use crate::data_types::phenotype::{ElementSubtype, ElementType, PredictionSoftware, SequenceStrand};
use crate::data_types::pipeline_result::OUTPUT_SCHEMA_VERSION;
use crate::data_types::profile::OrganismProfile;
use crate::data_types::qc::QcSoftware;
use crate::data_types::records::{VariantSubtype, VariantType};
use crate::data_types::typing::{TypingMethod, TypingSoftware};

const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Serialized names of every value of a unit enum
fn enum_schema<T: IntoEnumIterator + Serialize>() -> Value {
    let values: Vec<Value> = T::iter()
        .filter_map(|v| serde_json::to_value(v).ok())
        .collect();
    json!({ "enum": values })
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{name}") })
}

fn nullable(schema: Value) -> Value {
    json!({ "anyOf": [schema, { "type": "null" }] })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

/// An object schema; `required` lists the fields that can not be left out
fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// One arm of a union tagged by its `software` field
fn tagged(software: &str, mut properties: Value, required: &[&str]) -> Value {
    if let Some(fields) = properties.as_object_mut() {
        fields.insert("software".to_string(), json!({ "const": software }));
    }
    let mut required = required.to_vec();
    required.push("software");
    object(properties, &required)
}

fn string() -> Value {
    json!({ "type": "string" })
}

fn count() -> Value {
    json!({ "type": "integer", "minimum": 0 })
}

fn number() -> Value {
    json!({ "type": "number" })
}

fn percent() -> Value {
    json!({ "type": "number", "minimum": 0, "maximum": 100 })
}

fn gene_record() -> Value {
    object(json!({
        "gene_symbol": nullable(string()),
        "accession": nullable(string()),
        "sequence_name": nullable(string()),
        "element_type": reference("ElementType"),
        "element_subtype": reference("ElementSubtype"),
        "ref_start_pos": nullable(count()),
        "ref_end_pos": nullable(count()),
        "ref_gene_length": nullable(count()),
        "contig_id": nullable(string()),
        "query_start_pos": nullable(count()),
        "query_end_pos": nullable(count()),
        "strand": nullable(reference("SequenceStrand")),
        "identity": nullable(percent()),
        "coverage": nullable(percent()),
        "method": nullable(string()),
        "phenotypes": array_of(reference("PhenotypeInfo")),
        "details": {
            "oneOf": [
                tagged("amrfinder", json!({ "res_class": nullable(string()), "res_subclass": nullable(string()) }), &[]),
                tagged("resfinder", json!({ "depth": nullable(number()), "ref_database": array_of(string()) }), &[]),
                tagged("virulencefinder", json!({ "depth": nullable(number()), "note": nullable(string()) }), &[]),
                tagged("serotypefinder", json!({ "serotype": nullable(string()) }), &[])
            ]
        }
    }), &["element_type", "element_subtype", "details"])
}

fn variant_record() -> Value {
    object(json!({
        "variant_type": reference("VariantType"),
        "variant_subtype": nullable(reference("VariantSubtype")),
        "phenotypes": array_of(reference("PhenotypeInfo")),
        "gene_symbol": { "type": "string", "minLength": 1 },
        "accession": nullable(string()),
        "position": { "type": "integer", "not": { "const": 0 } },
        "end": nullable(json!({ "type": "integer" })),
        "ref_nt": { "type": "string", "minLength": 1 },
        "alt_nt": { "type": "string", "minLength": 1 },
        "ref_aa": nullable(string()),
        "alt_aa": nullable(string()),
        "depth": nullable(json!({ "type": "number", "minimum": 0 })),
        "frequency": nullable(json!({ "type": "number", "minimum": 0, "maximum": 1 })),
        "method": nullable(string()),
        "passed_qc": nullable(json!({ "type": "boolean" })),
        "details": {
            "oneOf": [
                tagged("mykrobe", json!({ "confidence": nullable(count()) }), &[]),
                tagged("tbprofiler", json!({
                    "variant_effect": nullable(string()),
                    "hgvs_nt_change": nullable(string()),
                    "hgvs_aa_change": nullable(string())
                }), &[]),
                tagged("resfinder", json!({ "ref_database": array_of(string()) }), &[]),
                tagged("vcf", json!({ "quality": nullable(number()), "genotype_confidence": nullable(number()) }), &[])
            ]
        }
    }), &["variant_type", "gene_symbol", "position", "ref_nt", "alt_nt", "passed_qc", "details"])
}

fn qc_results() -> Vec<(&'static str, Value)> {
    vec![
        ("QuastQcResult", object(json!({
            "total_length": count(),
            "reference_length": nullable(count()),
            "largest_contig": count(),
            "n_contigs": count(),
            "n50": count(),
            "ng50": nullable(count()),
            "assembly_gc": percent(),
            "reference_gc": nullable(percent()),
            "duplication_ratio": nullable(json!({ "type": "number", "minimum": 0 }))
        }), &["total_length", "largest_contig", "n_contigs", "n50", "assembly_gc"])),
        ("PostAlignQcResult", object(json!({
            "ins_size": nullable(number()),
            "ins_size_dev": nullable(number()),
            "mean_cov": { "type": "number", "minimum": 0 },
            "pct_above_x": { "type": "object", "additionalProperties": percent() },
            "n_reads": count(),
            "n_mapped_reads": count(),
            "n_read_pairs": count(),
            "coverage_uniformity": nullable(percent()),
            "quartile1": number(),
            "median_cov": number(),
            "quartile3": number()
        }), &["mean_cov", "pct_above_x", "n_reads", "n_mapped_reads", "n_read_pairs", "quartile1", "median_cov", "quartile3"])),
        ("MissingLociQcResult", object(json!({ "n_missing": count() }), &["n_missing"]))
    ]
}

fn typing_results() -> Vec<(&'static str, Value)> {
    let alleles = json!({
        "type": "object",
        "additionalProperties": nullable(json!({ "anyOf": [count(), string()] }))
    });
    vec![
        ("MlstResult", object(json!({
            "scheme": { "type": "string", "minLength": 1 },
            "sequence_type": nullable(count()),
            "alleles": alleles.clone()
        }), &["scheme", "alleles"])),
        ("CgmlstResult", object(json!({
            "n_novel": count(),
            "n_missing": count(),
            "alleles": alleles
        }), &["n_novel", "n_missing", "alleles"])),
        ("LineageResult", object(json!({
            "main_lineage": nullable(string()),
            "sub_lineage": nullable(string()),
            "lineages": array_of(object(json!({
                "lineage": { "type": "string", "minLength": 1 },
                "family": nullable(string()),
                "spoligotype": nullable(string()),
                "rd": nullable(string()),
                "fraction": nullable(json!({ "type": "number", "minimum": 0, "maximum": 1 }))
            }), &["lineage"]))
        }), &["lineages"]))
    ]
}

/// JSON Schema (draft 2020-12) of a result document.
/// Cross-field rules such as subtype membership, sorted species hits, or disjoint phenotype sets are only checked by `validate`.
pub fn result_schema() -> Value {
    let mut defs = Map::new();
    let enums = [
        ("ElementType", enum_schema::<ElementType>()),
        ("ElementSubtype", enum_schema::<ElementSubtype>()),
        ("SequenceStrand", enum_schema::<SequenceStrand>()),
        ("PredictionSoftware", enum_schema::<PredictionSoftware>()),
        ("VariantType", enum_schema::<VariantType>()),
        ("VariantSubtype", enum_schema::<VariantSubtype>()),
        ("TypingMethod", enum_schema::<TypingMethod>()),
        ("TypingSoftware", enum_schema::<TypingSoftware>()),
        ("QcSoftware", enum_schema::<QcSoftware>()),
        ("SoupType", enum_schema::<SoupType>()),
        ("OrganismProfile", enum_schema::<OrganismProfile>())
    ];
    for (name, schema) in enums.into_iter().chain(qc_results()).chain(typing_results()) {
        defs.insert(name.to_string(), schema);
    }

    let records = [
        ("PhenotypeInfo", object(json!({
            "name": { "type": "string", "minLength": 1 },
            "group": nullable(string()),
            "type": reference("ElementType"),
            "reference": array_of(string()),
            "note": nullable(string())
        }), &["name", "type"])),
        ("GeneRecord", gene_record()),
        ("VariantRecord", variant_record()),
        ("MethodResult", object(json!({
            "type": reference("ElementType"),
            "software": reference("PredictionSoftware"),
            "result": object(json!({
                "phenotypes": object(json!({
                    "susceptible": { "type": "array", "items": string(), "uniqueItems": true },
                    "resistant": { "type": "array", "items": string(), "uniqueItems": true }
                }), &["susceptible", "resistant"]),
                "genes": array_of(reference("GeneRecord")),
                "variants": array_of(reference("VariantRecord"))
            }), &["phenotypes", "genes", "variants"])
        }), &["type", "software", "result"])),
        ("QcMethodResult", object(json!({
            "software": reference("QcSoftware"),
            "version": nullable(string()),
            "result": { "anyOf": [reference("QuastQcResult"), reference("PostAlignQcResult"), reference("MissingLociQcResult")] }
        }), &["software", "result"])),
        ("TypingMethodResult", object(json!({
            "type": reference("TypingMethod"),
            "software": reference("TypingSoftware"),
            "result": { "anyOf": [reference("GeneRecord"), reference("MlstResult"), reference("CgmlstResult"), reference("LineageResult")] }
        }), &["type", "software", "result"])),
        ("SoupVersion", object(json!({
            "name": { "type": "string", "minLength": 1 },
            "version": { "type": "string", "minLength": 1 },
            "type": reference("SoupType")
        }), &["name", "version", "type"])),
        ("RunMetadata", object(json!({
            "run": object(json!({
                "pipeline": string(),
                "version": string(),
                "commit": nullable(string()),
                "analysis_profile": nullable(string()),
                "configuration_files": array_of(string()),
                "workflow_name": nullable(string()),
                "sample_name": string(),
                "lims_id": nullable(string()),
                "sequencing_run": nullable(string()),
                "sequencing_platform": nullable(string()),
                "sequencing_type": nullable(string()),
                "command": nullable(string()),
                "date": string()
            }), &["pipeline", "version", "sample_name", "date"]),
            "databases": array_of(reference("SoupVersion"))
        }), &["run", "databases"])),
        ("SpeciesPrediction", object(json!({
            "software": string(),
            "hits": array_of(object(json!({
                "scientific_name": { "type": "string", "minLength": 1 },
                "taxonomy_id": count(),
                "taxonomy_lvl": nullable(string()),
                "kraken_assigned_reads": count(),
                "added_reads": count(),
                "fraction_total_reads": { "type": "number", "minimum": 0, "maximum": 1 }
            }), &["scientific_name", "taxonomy_id", "kraken_assigned_reads", "added_reads", "fraction_total_reads"]))
        }), &["software", "hits"])),
        ("ReferenceGenome", object(json!({
            "name": string(),
            "accession": string(),
            "fasta": string(),
            "fasta_index": nullable(string()),
            "genes": string()
        }), &["name", "accession", "fasta", "genes"])),
        ("AnnotationTrack", object(json!({ "name": string(), "file": string() }), &["name", "file"]))
    ];
    for (name, schema) in records {
        defs.insert(name.to_string(), schema);
    }

    let mut schema = object(json!({
        "sample_id": { "type": "string", "minLength": 1 },
        "schema_version": { "const": OUTPUT_SCHEMA_VERSION },
        "profile": reference("OrganismProfile"),
        "run_metadata": reference("RunMetadata"),
        "qc": array_of(reference("QcMethodResult")),
        "species_prediction": nullable(reference("SpeciesPrediction")),
        "typing_result": array_of(reference("TypingMethodResult")),
        "element_type_result": array_of(reference("MethodResult")),
        "reference_genome": nullable(reference("ReferenceGenome")),
        "read_mapping": nullable(string()),
        "genome_annotation": nullable(array_of(reference("AnnotationTrack"))),
        "snv_variants": nullable(array_of(reference("VariantRecord"))),
        "sv_variants": nullable(array_of(reference("VariantRecord")))
    }), &["sample_id", "schema_version", "profile", "run_metadata"]);
    if let Some(root) = schema.as_object_mut() {
        root.insert("$schema".to_string(), json!(SCHEMA_DIALECT));
        root.insert("title".to_string(), json!("PipelineResult"));
        root.insert("$defs".to_string(), Value::Object(defs));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::aggregator::{aggregate_sample, SampleInputsBuilder};

    #[test]
    fn test_enum_values() {
        let schema = result_schema();
        assert_eq!(schema["$defs"]["ElementType"]["enum"], json!(["AMR", "STRESS", "VIRULENCE"]));
        assert_eq!(schema["$defs"]["TypingMethod"]["enum"], json!(["mlst", "cgmlst", "lineage", "stx", "O_type", "H_type"]));
        assert_eq!(schema["$defs"]["SequenceStrand"]["enum"], json!(["+", "-"]));
        assert_eq!(schema["properties"]["schema_version"]["const"], json!(OUTPUT_SCHEMA_VERSION));
    }

    #[test]
    fn test_references_resolve() {
        let schema = result_schema();
        let text = serde_json::to_string(&schema).unwrap();
        for part in text.split("\"#/$defs/").skip(1) {
            let name = part.split('"').next().unwrap();
            assert!(schema["$defs"].get(name).is_some(), "unresolved reference {name}");
        }
    }

    #[test]
    fn test_result_fields_are_described() {
        let inputs = SampleInputsBuilder::default()
            .sample_id("sample_1".to_string())
            .run_metadata(PathBuf::from("test_data/metadata/run_metadata.json"))
            .quast(Some(PathBuf::from("test_data/qc/quast.tsv")))
            .amrfinder(Some(PathBuf::from("test_data/amrfinder/amrfinder.tsv")))
            .build().unwrap();
        let result = aggregate_sample(OrganismProfile::Staphylococcus, &inputs).unwrap();
        let value = serde_json::to_value(&result).unwrap();

        let schema = result_schema();
        let properties = schema["properties"].as_object().unwrap();
        for key in value.as_object().unwrap().keys() {
            assert!(properties.contains_key(key), "{key} is not in the schema");
        }
        let gene_properties = schema["$defs"]["GeneRecord"]["properties"].as_object().unwrap();
        for key in value["element_type_result"][0]["result"]["genes"][0].as_object().unwrap().keys() {
            assert!(gene_properties.contains_key(key), "genes.{key} is not in the schema");
        }
    }
}
