//! Declaration model loading.
//!
//! The driver consumes a JSON description of the compilation's types,
//! members, and annotations. Loading is two-pass: every type is declared
//! first so cross references resolve regardless of file order, then
//! members, supertypes, and bounds are filled in.
//!
//! Type references are written as Java-like strings (`a.Map<K, time.Clock>`)
//! and parsed by a small recursive-descent parser. A name that resolves to
//! neither a declared type, a primitive, nor a type variable in scope
//! becomes an error reference, which defers the enclosing declaration
//! instead of failing the load.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use knit_ir::{
    CacheAnnotation, CachingStrategy, FieldSpec, Host, HostBuilder, MethodSpec, ModifierSet,
    Primitive, StrategyValue, TypeId, TypeKind, TypeParam, TypeRef,
};

/// Failure to load a declaration model.
#[derive(Debug)]
pub enum InputError {
    Io(io::Error),
    Json(serde_json::Error),
    /// Structural problem the JSON schema cannot express.
    Model(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Io(e) => write!(f, "failed to read model: {e}"),
            InputError::Json(e) => write!(f, "failed to parse model: {e}"),
            InputError::Model(msg) => write!(f, "invalid model: {msg}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io(e) => Some(e),
            InputError::Json(e) => Some(e),
            InputError::Model(_) => None,
        }
    }
}

impl From<io::Error> for InputError {
    fn from(e: io::Error) -> Self {
        InputError::Io(e)
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Json(e)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ModelJson {
    types: Vec<TypeJson>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TypeJson {
    /// Qualified name, e.g. `com.acme.App`.
    name: String,
    kind: String,
    #[serde(default)]
    module: bool,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default)]
    type_params: Vec<TypeParamJson>,
    #[serde(default)]
    extends: Vec<String>,
    #[serde(default)]
    enclosing: Option<String>,
    #[serde(default)]
    cache: Option<CacheJson>,
    #[serde(default)]
    methods: Vec<MethodJson>,
    #[serde(default)]
    fields: Vec<FieldJson>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TypeParamJson {
    name: String,
    #[serde(default)]
    bounds: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MethodJson {
    name: String,
    returns: String,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default)]
    type_params: Vec<TypeParamJson>,
    #[serde(default)]
    params: Vec<ParamJson>,
    #[serde(default)]
    throws: Vec<String>,
    #[serde(default)]
    cache: Option<CacheJson>,
    #[serde(default)]
    lookup: Option<LookupJson>,
    #[serde(default)]
    make: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ParamJson {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default)]
    cache: Option<CacheJson>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CacheJson {
    value: String,
    #[serde(default)]
    nullable: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LookupJson {
    #[serde(default)]
    value: String,
    #[serde(default)]
    field: String,
    #[serde(default)]
    method: String,
    #[serde(default)]
    param: String,
}

/// Load a declaration model from a JSON file.
pub fn load_model(path: &Path) -> Result<Host, InputError> {
    let text = fs::read_to_string(path)?;
    parse_model(&text)
}

/// Parse a declaration model from JSON text.
pub fn parse_model(text: &str) -> Result<Host, InputError> {
    let model: ModelJson = serde_json::from_str(text)?;
    let mut builder = HostBuilder::new();

    // Pass 1: declare every type.
    let mut ids: FxHashMap<String, TypeId> = FxHashMap::default();
    for ty in &model.types {
        let kind = match ty.kind.as_str() {
            "interface" => TypeKind::Interface,
            "class" => TypeKind::Class,
            other => {
                return Err(InputError::Model(format!(
                    "type `{}` has unknown kind `{other}`",
                    ty.name
                )))
            }
        };
        if ids.contains_key(&ty.name) {
            return Err(InputError::Model(format!("duplicate type `{}`", ty.name)));
        }
        let id = builder.declare_type(&ty.name, kind);
        ids.insert(ty.name.clone(), id);
    }

    // Pass 2: members, supertypes, bounds.
    for ty in &model.types {
        let id = ids[&ty.name];
        if ty.module {
            builder.mark_module(id);
        }
        builder.set_modifiers(id, parse_modifiers(&ty.modifiers)?);
        if let Some(cache) = &ty.cache {
            let annotation = parse_cache(&mut builder, cache);
            builder.set_type_cache(id, annotation);
        }
        if let Some(enclosing) = &ty.enclosing {
            let Some(&outer) = ids.get(enclosing) else {
                return Err(InputError::Model(format!(
                    "type `{}` has undeclared enclosing type `{enclosing}`",
                    ty.name
                )));
            };
            builder.set_enclosing(id, outer);
        }

        let type_vars: FxHashSet<&str> =
            ty.type_params.iter().map(|p| p.name.as_str()).collect();
        for param in &ty.type_params {
            let bounds = param
                .bounds
                .iter()
                .map(|b| parse_type(&mut builder, &ids, &type_vars, b))
                .collect();
            builder.add_type_param(id, &param.name, bounds);
        }
        for sup in &ty.extends {
            let parsed = parse_type(&mut builder, &ids, &type_vars, sup);
            builder.add_supertype(id, parsed);
        }

        for method in &ty.methods {
            let mut vars = type_vars.clone();
            vars.extend(method.type_params.iter().map(|p| p.name.as_str()));

            let ret = parse_type(&mut builder, &ids, &vars, &method.returns);
            let mut spec = MethodSpec::new(&method.name, ret)
                .modifiers(parse_modifiers(&method.modifiers)?);
            for tp in &method.type_params {
                let bounds = tp
                    .bounds
                    .iter()
                    .map(|b| parse_type(&mut builder, &ids, &vars, b))
                    .collect();
                let name = builder.intern(&tp.name);
                spec = spec.type_param(TypeParam { name, bounds });
            }
            for param in &method.params {
                let parsed = parse_type(&mut builder, &ids, &vars, &param.ty);
                spec = spec.param(&param.name, parsed);
            }
            for thrown in &method.throws {
                spec = spec.throws(parse_type(&mut builder, &ids, &vars, thrown));
            }
            if let Some(cache) = &method.cache {
                spec = spec.cache(parse_cache(&mut builder, cache));
            }
            if let Some(lookup) = &method.lookup {
                let parsed = builder.lookup_spec(
                    &lookup.value,
                    &lookup.field,
                    &lookup.method,
                    &lookup.param,
                );
                spec = spec.lookup(parsed);
            }
            if let Some(make) = &method.make {
                spec = spec.make(parse_type(&mut builder, &ids, &vars, make));
            }
            builder.add_method(id, spec);
        }

        for field in &ty.fields {
            let parsed = parse_type(&mut builder, &ids, &type_vars, &field.ty);
            let mut spec =
                FieldSpec::new(&field.name, parsed).modifiers(parse_modifiers(&field.modifiers)?);
            if let Some(cache) = &field.cache {
                spec = spec.cache(parse_cache(&mut builder, cache));
            }
            builder.add_field(id, spec);
        }
    }

    Ok(builder.finish())
}

fn parse_modifiers(words: &[String]) -> Result<ModifierSet, InputError> {
    let mut set = ModifierSet::empty();
    for word in words {
        set |= match word.as_str() {
            "abstract" => ModifierSet::ABSTRACT,
            "static" => ModifierSet::STATIC,
            "final" => ModifierSet::FINAL,
            "default" => ModifierSet::DEFAULT,
            "private" => ModifierSet::PRIVATE,
            "protected" => ModifierSet::PROTECTED,
            "public" => ModifierSet::PUBLIC,
            other => {
                return Err(InputError::Model(format!("unknown modifier `{other}`")));
            }
        };
    }
    Ok(set)
}

fn parse_cache(builder: &mut HostBuilder, cache: &CacheJson) -> CacheAnnotation {
    let value = match CachingStrategy::parse(&cache.value) {
        Some(strategy) => StrategyValue::Known(strategy),
        // Kept verbatim; the resolver reports it with the element attached.
        None => StrategyValue::Unknown(builder.intern(&cache.value)),
    };
    CacheAnnotation {
        value,
        nullable: cache.nullable,
    }
}

/// Parse a Java-like type expression. Unresolvable names become
/// [`TypeRef::Error`] rather than load failures.
fn parse_type(
    builder: &mut HostBuilder,
    ids: &FxHashMap<String, TypeId>,
    vars: &FxHashSet<&str>,
    text: &str,
) -> TypeRef {
    let mut parser = TypeParser {
        builder,
        ids,
        vars,
        chars: text.char_indices().peekable(),
        text,
    };
    let parsed = parser.parse();
    if parser.chars.next().is_some() {
        tracing::warn!(text, "trailing characters in type expression");
        return TypeRef::Error;
    }
    parsed
}

struct TypeParser<'a, 'b> {
    builder: &'a mut HostBuilder,
    ids: &'a FxHashMap<String, TypeId>,
    vars: &'a FxHashSet<&'b str>,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
}

impl TypeParser<'_, '_> {
    fn parse(&mut self) -> TypeRef {
        self.skip_spaces();
        let name = self.take_name();
        if name.is_empty() {
            return TypeRef::Error;
        }
        if let Some(primitive) = Primitive::parse(&name) {
            return TypeRef::Primitive(primitive);
        }

        let mut args = Vec::new();
        self.skip_spaces();
        if let Some(&(_, '<')) = self.chars.peek() {
            self.chars.next();
            loop {
                args.push(self.parse());
                self.skip_spaces();
                match self.chars.next() {
                    Some((_, ',')) => {}
                    Some((_, '>')) => break,
                    _ => return TypeRef::Error,
                }
            }
        }

        if args.is_empty() && self.vars.contains(name.as_str()) {
            return TypeRef::Var(self.builder.intern(&name));
        }
        match self.ids.get(&name) {
            Some(&decl) => TypeRef::Declared { decl, args },
            None => {
                tracing::debug!(name, "unresolved type reference");
                TypeRef::Error
            }
        }
    }

    fn take_name(&mut self) -> String {
        let start = match self.chars.peek() {
            Some(&(i, _)) => i,
            None => return String::new(),
        };
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        self.text[start..end].to_owned()
    }

    fn skip_spaces(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == ' ' {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}
