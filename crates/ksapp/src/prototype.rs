// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Prototypes: parameterised jsonnet snippets shipped inside packages.
//!
//! A prototype file starts with a header of `// @directive` comments
//! describing it, followed by the template body:
//!
//! ```text
//! // @apiVersion 0.0.1
//! // @name io.ksonnet.pkg.nginx-simple
//! // @description Deploys a simple, stateless nginx server.
//! // @shortDescription A simple nginx deployment
//! // @param name string Name to give to each of the components
//! // @optionalParam replicas number 1 Number of replicas
//!
//! local k = import 'k.libsonnet';
//! ```
//!
//! Only the header is interpreted here; rendering the body is left to the
//! template engine.

use std::fmt;
use std::path::Path;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./prototype_test.rs"]
mod prototype_test;

/// Default `@apiVersion` when a prototype omits it.
pub const DEFAULT_PROTOTYPE_API_VERSION: &str = "0.0.1";

/// Value types a prototype parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    NumberOrString,
    Array,
    Object,
}

impl ParamType {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Self::String,
            "number" => Self::Number,
            "number-or-string" => Self::NumberOrString,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => return None,
        })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Number => "number",
            Self::NumberOrString => "number-or-string",
            Self::Array => "array",
            Self::Object => "object",
        })
    }
}

/// A declared prototype parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSchema {
    pub name: String,
    pub param_type: ParamType,
    /// Set for `@optionalParam`; `None` means the parameter is required.
    pub default: Option<String>,
    pub description: String,
}

impl ParamSchema {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A parsed prototype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub api_version: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub params: Vec<ParamSchema>,
    pub template: String,
}

impl Prototype {
    pub fn required_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.params.iter().filter(|p| p.is_required())
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.params.iter().filter(|p| !p.is_required())
    }
}

#[derive(Clone, Copy)]
enum Continues {
    Nothing,
    Description,
    ShortDescription,
}

/// Parse a prototype from its source text. `path` is used in errors.
pub fn parse(path: &Path, source: &str) -> Result<Prototype> {
    let invalid = |reason: String| Error::InvalidPrototype {
        path: path.to_path_buf(),
        reason,
    };

    let mut api_version = None;
    let mut name = None;
    let mut description: Option<String> = None;
    let mut short_description = String::new();
    let mut params = Vec::new();
    let mut continues = Continues::Nothing;

    let mut lines = source.lines().peekable();
    while let Some(&line) = lines.peek() {
        let Some(comment) = line.trim_start().strip_prefix("//") else {
            break;
        };
        lines.next();
        let comment = comment.trim();

        let Some(directive) = comment.strip_prefix('@') else {
            // Plain comment lines extend a preceding description.
            match (continues, comment.is_empty()) {
                (_, true) | (Continues::Nothing, _) => {}
                (Continues::Description, false) => {
                    if let Some(d) = description.as_mut() {
                        d.push(' ');
                        d.push_str(comment);
                    }
                }
                (Continues::ShortDescription, false) => {
                    short_description.push(' ');
                    short_description.push_str(comment);
                }
            }
            continue;
        };

        let (key, rest) = match directive.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (directive, ""),
        };
        continues = Continues::Nothing;
        match key {
            "apiVersion" => api_version = Some(rest.to_string()),
            "name" => name = Some(rest.to_string()),
            "description" => {
                description = Some(rest.to_string());
                continues = Continues::Description;
            }
            "shortDescription" => {
                short_description = rest.to_string();
                continues = Continues::ShortDescription;
            }
            "param" => params.push(parse_param(rest, false).map_err(&invalid)?),
            "optionalParam" => params.push(parse_param(rest, true).map_err(&invalid)?),
            other => return Err(invalid(format!("unknown directive @{other}"))),
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| invalid("missing @name".to_string()))?;
    let description = description
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("missing @description".to_string()))?;

    let template = lines.collect::<Vec<_>>().join("\n");

    Ok(Prototype {
        api_version: api_version
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PROTOTYPE_API_VERSION.to_string()),
        name,
        description,
        short_description,
        params,
        template: template.trim_start_matches('\n').to_string(),
    })
}

fn parse_param(rest: &str, optional: bool) -> std::result::Result<ParamSchema, String> {
    let directive = if optional { "@optionalParam" } else { "@param" };
    let mut fields = rest.splitn(if optional { 4 } else { 3 }, char::is_whitespace);

    let name = fields
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("{directive} requires a name"))?;
    let type_name = fields
        .next()
        .ok_or_else(|| format!("{directive} {name} requires a type"))?;
    let param_type = ParamType::parse(type_name)
        .ok_or_else(|| format!("{directive} {name} has unknown type {type_name:?}"))?;
    let default = if optional {
        Some(
            fields
                .next()
                .ok_or_else(|| format!("{directive} {name} requires a default value"))?
                .to_string(),
        )
    } else {
        None
    };
    let description = fields.next().unwrap_or_default().trim().to_string();

    Ok(ParamSchema {
        name: name.to_string(),
        param_type,
        default,
        description,
    })
}
