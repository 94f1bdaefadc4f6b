use super::DefinitionService;
use crate::ast::{SourceLocation, TypeNode};
use crate::error::Result;
use crate::parser::{AstParser, ParsedFile};
use log::debug;
use oxc_resolver::{ResolveOptions, Resolver};
use std::path::{Path, PathBuf};

/// Extensions tried when an import specifier has none.
const MODULE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".mts", ".cts",
];

/// Definition lookup answered from the source files themselves.
///
/// Understands same-file aliases and named `import`/`import type` bindings. Specifiers are
/// resolved the way Node does (relative paths, `index` files, `node_modules` packages).
/// Re-exports are not followed.
#[derive(Debug)]
pub struct SourceIndexService {
    resolver: Resolver,
}

impl Default for SourceIndexService {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceIndexService {
    pub fn new() -> Self {
        let resolver = Resolver::new(ResolveOptions {
            extensions: MODULE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            condition_names: vec!["import".into(), "module".into(), "default".into()],
            symlinks: false,
            ..Default::default()
        });
        Self { resolver }
    }

    /// Finds the file an import specifier points at.
    fn resolve_module(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        let from_dir = importer
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        // The resolver works on absolute directories.
        let from_dir = std::path::absolute(from_dir).ok()?;
        match self.resolver.resolve(&from_dir, specifier) {
            Ok(resolution) => Some(resolution.path().to_path_buf()),
            Err(e) => {
                debug!(
                    "Cannot resolve module '{}' from {}: {}",
                    specifier,
                    importer.display(),
                    e
                );
                None
            }
        }
    }
}

impl DefinitionService for SourceIndexService {
    fn lookup_definition(&self, query: &SourceLocation) -> Result<Option<SourceLocation>> {
        let file = AstParser::parse_file(&query.file)?;

        if file
            .type_aliases()
            .any(|alias| query.matches_span(alias.name_span) || query.matches_span(alias.span))
        {
            debug!("{} is a declaration site", query);
            return Ok(Some(query.clone()));
        }

        let Some(name) = reference_at(&file, query) else {
            debug!("No type reference at {}", query);
            return Ok(None);
        };

        if let Some(alias) = file.find_alias(&name) {
            return Ok(Some(SourceLocation::from_span(&file.path, alias.name_span)));
        }

        let Some((import, binding)) = file.find_import(&name) else {
            debug!("`{}` is neither declared nor imported in {}", name, file.path.display());
            return Ok(None);
        };

        let Some(target) = self.resolve_module(&file.path, &import.source) else {
            return Ok(None);
        };

        let imported = AstParser::parse_file(&target)?;
        Ok(imported
            .find_alias(&binding.imported)
            .map(|alias| SourceLocation::from_span(&imported.path, alias.name_span)))
    }
}

/// Name of the type reference or import binding starting at `location`.
fn reference_at(file: &ParsedFile, location: &SourceLocation) -> Option<String> {
    let mut found = None;
    for statement in &file.statements {
        statement.walk_types(&mut |node| {
            if found.is_none() && location.matches_span(node.span()) {
                if let TypeNode::Reference { name, .. } = node {
                    found = Some(name.clone());
                }
            }
        });
        if found.is_some() {
            return found;
        }
    }

    file.imports()
        .flat_map(|import| import.bindings.iter())
        .find(|binding| location.matches_span(binding.local_span))
        .map(|binding| binding.local.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    fn at(file: &Path, line: u32, column: u32) -> SourceLocation {
        SourceLocation::new(
            file.to_path_buf(),
            Position::new(line, column),
            Position::new(line, column),
        )
    }

    #[test]
    fn test_same_file_alias() {
        let dir = TempDir::new().unwrap();
        let file = create_temp_file(
            &dir,
            "controller.js",
            "type Pet = { name: string };\ntype Wrapper = { pet: Pet };\n",
        );

        // `Pet` inside `Wrapper` (line 2, column 23)
        let answer = SourceIndexService::new()
            .lookup_definition(&at(&file, 2, 23))
            .unwrap()
            .unwrap();

        assert_eq!(answer.file, file);
        assert_eq!(answer.start, Position::new(1, 6));
    }

    #[test]
    fn test_declaration_is_fixed_point() {
        let dir = TempDir::new().unwrap();
        let file = create_temp_file(&dir, "model.js", "export type Pet = { name: string };\n");
        let query = at(&file, 1, 13);

        assert_eq!(SourceIndexService::new().lookup_definition(&query).unwrap(), Some(query));
    }

    #[test]
    fn test_follows_import_binding() {
        let dir = TempDir::new().unwrap();
        let model = create_temp_file(&dir, "models/pet.js", "export type Pet = { id: number };\n");
        let controller = create_temp_file(
            &dir,
            "controller.js",
            "import type {Pet as Animal} from './models/pet';\ntype Box = { item: Animal };\n",
        );

        let answer = SourceIndexService::new()
            .lookup_definition(&at(&controller, 2, 20))
            .unwrap()
            .unwrap();

        assert_eq!(answer.file, model);
        assert_eq!(answer.start, Position::new(1, 13));
    }

    #[test]
    fn test_index_module_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let types = create_temp_file(&dir, "types/index.js", "export type Path<T> = T;\n");
        let controller = create_temp_file(
            &dir,
            "controllers/pets.js",
            "import type {Path} from '../types';\ntype Id = { id: Path<number> };\n",
        );

        let answer = SourceIndexService::new()
            .lookup_definition(&at(&controller, 2, 17))
            .unwrap()
            .unwrap();

        assert_eq!(answer.file, types);
    }

    #[test]
    fn test_unknown_name_has_no_answer() {
        let dir = TempDir::new().unwrap();
        let file = create_temp_file(&dir, "controller.js", "type Box = { item: Missing };\n");

        assert_eq!(SourceIndexService::new().lookup_definition(&at(&file, 1, 20)).unwrap(), None);
        assert_eq!(SourceIndexService::new().lookup_definition(&at(&file, 1, 2)).unwrap(), None);
    }

    #[test]
    fn test_follows_package_import() {
        let dir = TempDir::new().unwrap();
        create_temp_file(
            &dir,
            "node_modules/petstore-types/package.json",
            r#"{ "name": "petstore-types", "main": "lib/index.js" }"#,
        );
        let model = create_temp_file(
            &dir,
            "node_modules/petstore-types/lib/index.js",
            "export type Pet = { id: number };\n",
        );
        let file = create_temp_file(
            &dir,
            "controller.js",
            "import type {Pet} from 'petstore-types';\ntype Box = { item: Pet };\n",
        );

        let answer = SourceIndexService::new()
            .lookup_definition(&at(&file, 2, 20))
            .unwrap()
            .unwrap();

        assert_eq!(answer.file, model);
        assert_eq!(answer.start, Position::new(1, 13));
    }

    #[test]
    fn test_missing_package_has_no_answer() {
        let dir = TempDir::new().unwrap();
        let file = create_temp_file(
            &dir,
            "controller.js",
            "import type {Pet} from 'not-installed';\ntype Box = { item: Pet };\n",
        );

        assert_eq!(SourceIndexService::new().lookup_definition(&at(&file, 2, 20)).unwrap(), None);
    }
}
