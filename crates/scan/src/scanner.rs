// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AST walk and entry-point classification.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::ScanError;

/// Function names that mark an entry as main-like when `fn main` is absent.
const MAIN_LIKE_NAMES: [&str; 3] = ["run", "start", "execute"];

/// Trait name that marks a type as implementing the cradle shape.
const CRADLE_TRAIT: &str = "Cradle";

/// What kind of entry point a record describes. Lower priority wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// A type implementing the cradle contract.
    CradleImpl,
    /// The conventional `fn main`.
    Main,
    /// A function named `run`, `start`, or `execute`.
    MainLike,
    /// A type with an inherent `call` method.
    CallableType,
    /// A top-level macro invocation; enumerated but never selectable.
    TopLevelCall,
    /// Any other parameterless function.
    Function,
}

impl EntryKind {
    pub fn priority(self) -> u8 {
        match self {
            EntryKind::CradleImpl => 0,
            EntryKind::Main => 1,
            EntryKind::MainLike => 2,
            EntryKind::CallableType => 3,
            EntryKind::TopLevelCall => 4,
            EntryKind::Function => 5,
        }
    }

    /// Whether the selection rule may pick this kind. Top-level invocations
    /// name things that are not callable definitions.
    pub fn selectable(self) -> bool {
        !matches!(self, EntryKind::TopLevelCall)
    }
}

/// A ranked entry-point candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPoint {
    pub kind: EntryKind,
    pub name: String,
    pub priority: u8,
    pub description: String,
}

impl EntryPoint {
    fn new(kind: EntryKind, name: impl Into<String>, description: String) -> Self {
        Self {
            kind,
            name: name.into(),
            priority: kind.priority(),
            description,
        }
    }
}

/// A top-level function found in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnInfo {
    pub name: String,
    pub args: Vec<String>,
    pub is_async: bool,
}

impl FnInfo {
    fn is_main_like(&self) -> bool {
        MAIN_LIKE_NAMES.contains(&self.name.as_str())
    }
}

/// A top-level type found in the file, with what its impl blocks declare.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeInfo {
    pub name: String,
    /// Trait names this type implements ("declared bases").
    pub traits: Vec<String>,
    /// Inherent method names.
    pub methods: Vec<String>,
    pub has_call: bool,
    pub has_new: bool,
    pub is_cradle: bool,
}

/// A top-level macro invocation such as `job!(…);`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroCall {
    pub name: String,
}

/// Everything the scanner learned about a file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub has_main: bool,
    pub functions: Vec<FnInfo>,
    pub types: Vec<TypeInfo>,
    pub macro_calls: Vec<MacroCall>,
    /// Candidates sorted by priority, stable within a priority.
    pub entry_points: Vec<EntryPoint>,
}

/// Scan a source file on disk.
pub fn scan(path: &Path) -> Result<ScanReport, ScanError> {
    let source = std::fs::read_to_string(path).map_err(|source| ScanError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&source, &path.display().to_string())
}

/// Scan source text directly.
pub fn scan_source(source: &str) -> Result<ScanReport, ScanError> {
    parse(source, "<inline>")
}

fn parse(source: &str, context: &str) -> Result<ScanReport, ScanError> {
    let file = syn::parse_file(source).map_err(|source| ScanError::Parse {
        context: context.to_string(),
        source,
    })?;

    let mut functions = Vec::new();
    // Declaration order matters for ranking, so keep an ordered map keyed by
    // insertion while impl blocks accumulate onto earlier declarations.
    let mut type_order: Vec<String> = Vec::new();
    let mut types: BTreeMap<String, TypeInfo> = BTreeMap::new();
    let mut macro_calls = Vec::new();

    // Declarations first: impl blocks may precede the type they extend.
    for item in &file.items {
        match item {
            syn::Item::Struct(s) => declare_type(&mut type_order, &mut types, &s.ident),
            syn::Item::Enum(e) => declare_type(&mut type_order, &mut types, &e.ident),
            _ => {}
        }
    }

    for item in &file.items {
        match item {
            syn::Item::Fn(f) => functions.push(fn_info(f)),
            syn::Item::Impl(imp) => record_impl(&mut types, imp),
            syn::Item::Macro(m) => {
                // `macro_rules!` definitions carry an ident; invocations do not.
                if m.ident.is_none() {
                    if let Some(segment) = m.mac.path.segments.last() {
                        macro_calls.push(MacroCall {
                            name: segment.ident.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    let has_main = functions.iter().any(|f| f.name == "main");
    let ordered_types: Vec<TypeInfo> = type_order
        .iter()
        .filter_map(|name| types.get(name).cloned())
        .collect();

    let entry_points = rank(has_main, &functions, &ordered_types, &macro_calls);

    tracing::debug!(
        context,
        functions = functions.len(),
        types = ordered_types.len(),
        entry_points = entry_points.len(),
        "scanned source file"
    );

    Ok(ScanReport {
        has_main,
        functions,
        types: ordered_types,
        macro_calls,
        entry_points,
    })
}

fn fn_info(f: &syn::ItemFn) -> FnInfo {
    let args = f
        .sig
        .inputs
        .iter()
        .map(|arg| match arg {
            syn::FnArg::Receiver(_) => "self".to_string(),
            syn::FnArg::Typed(pat) => match pat.pat.as_ref() {
                syn::Pat::Ident(ident) => ident.ident.to_string(),
                other => quote_pat(other),
            },
        })
        .collect();

    FnInfo {
        name: f.sig.ident.to_string(),
        args,
        is_async: f.sig.asyncness.is_some(),
    }
}

fn quote_pat(pat: &syn::Pat) -> String {
    // Non-ident patterns (tuples, wildcards) keep a placeholder name.
    match pat {
        syn::Pat::Wild(_) => "_".to_string(),
        _ => "<pattern>".to_string(),
    }
}

fn declare_type(order: &mut Vec<String>, types: &mut BTreeMap<String, TypeInfo>, ident: &syn::Ident) {
    let name = ident.to_string();
    order.push(name.clone());
    types.entry(name.clone()).or_insert(TypeInfo {
        name,
        traits: Vec::new(),
        methods: Vec::new(),
        has_call: false,
        has_new: false,
        is_cradle: false,
    });
}

fn record_impl(types: &mut BTreeMap<String, TypeInfo>, imp: &syn::ItemImpl) {
    let Some(name) = impl_self_name(imp) else {
        return;
    };
    // Impls for types not declared in this file are out of scope.
    let Some(info) = types.get_mut(&name) else {
        return;
    };

    match &imp.trait_ {
        Some((_, trait_path, _)) => {
            if let Some(segment) = trait_path.segments.last() {
                let trait_name = segment.ident.to_string();
                if trait_name == CRADLE_TRAIT {
                    info.is_cradle = true;
                }
                info.traits.push(trait_name);
            }
        }
        None => {
            for item in &imp.items {
                if let syn::ImplItem::Fn(method) = item {
                    let method_name = method.sig.ident.to_string();
                    match method_name.as_str() {
                        "call" => info.has_call = true,
                        "new" => info.has_new = true,
                        _ => {}
                    }
                    info.methods.push(method_name);
                }
            }
        }
    }
}

fn impl_self_name(imp: &syn::ItemImpl) -> Option<String> {
    match imp.self_ty.as_ref() {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn rank(
    has_main: bool,
    functions: &[FnInfo],
    types: &[TypeInfo],
    macro_calls: &[MacroCall],
) -> Vec<EntryPoint> {
    let mut entries = Vec::new();

    for ty in types.iter().filter(|t| t.is_cradle) {
        entries.push(EntryPoint::new(
            EntryKind::CradleImpl,
            &ty.name,
            format!("Cradle implementation: {}", ty.name),
        ));
    }

    if has_main {
        entries.push(EntryPoint::new(
            EntryKind::Main,
            "main",
            "Conventional fn main".to_string(),
        ));
    }

    for f in functions.iter().filter(|f| f.is_main_like()) {
        entries.push(EntryPoint::new(
            EntryKind::MainLike,
            &f.name,
            format!("Main-like function: {}", f.name),
        ));
    }

    for ty in types.iter().filter(|t| t.has_call && !t.is_cradle) {
        entries.push(EntryPoint::new(
            EntryKind::CallableType,
            &ty.name,
            format!("Callable type: {}", ty.name),
        ));
    }

    for m in macro_calls {
        entries.push(EntryPoint::new(
            EntryKind::TopLevelCall,
            &m.name,
            format!("Top-level invocation: {}!", m.name),
        ));
    }

    for f in functions
        .iter()
        .filter(|f| f.args.is_empty() && !f.is_main_like() && f.name != "main")
    {
        entries.push(EntryPoint::new(
            EntryKind::Function,
            &f.name,
            format!("Parameterless function: {}", f.name),
        ));
    }

    // Each category was appended in ascending priority already; the sort is
    // stable so declaration order survives within a priority.
    entries.sort_by_key(|e| e.priority);
    entries
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
