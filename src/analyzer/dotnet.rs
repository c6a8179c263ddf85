use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{matches, parse_with, ManifestParser};
use crate::models::{
    DependencyType, Ecosystem, Package, ParseResult, ANY_VERSION, LOCAL_VERSION, SOURCE_PROJECT_REFERENCE,
};

/// Parser for MSBuild project files (`*.csproj`, `*.fsproj`, `*.vbproj`) and the
/// legacy NuGet `packages.config`.
///
/// `<PackageReference>` items take their version from the `Version` attribute or a
/// child `<Version>` element. `PrivateAssets="all"` marks a dev dependency.
/// `<ProjectReference>` items become local packages in the `buildDependencies`
/// bucket so they never count as runtime packages.
pub struct CsprojParser;

impl CsprojParser {
    /// Create a new `CsprojParser`.
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for CsprojParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::DotNet
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["csproj", ".csproj", "fsproj", "vbproj", "packages.config"]
    }

    fn can_parse(&self, content: &str) -> bool {
        let msbuild = matches(r"<Project[\s>]", content)
            && matches(r"<(PackageReference|ProjectReference|ItemGroup|PropertyGroup)[\s>/]", content);
        let packages_config = matches(r"<packages[\s>]", content) && matches(r"<package\s+id=", content);
        msbuild || packages_config
    }

    fn parse(&self, content: &str) -> ParseResult {
        parse_with(self.ecosystem(), self.file_type(), content, parse_project_file)
    }
}

/// A `<PackageReference>` whose closing tag has not been seen yet.
#[derive(Debug)]
struct OpenReference {
    name: String,
    version: Option<String>,
    private_assets: bool,
}

#[derive(Debug, Default)]
struct Identity {
    package_id: Option<String>,
    assembly_name: Option<String>,
    version: Option<String>,
}

fn parse_project_file(content: &str, result: &mut ParseResult) -> Result<()> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut open: Option<OpenReference> = None;
    let mut element_path: Vec<String> = Vec::new();
    let mut identity = Identity::default();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed XML at byte {}", reader.buffer_position()))?;

        match event {
            Event::Empty(ref e) => {
                let tag = local_name(e);
                handle_item(result, e, &tag, false, &mut open)?;
            }
            Event::Start(ref e) => {
                let tag = local_name(e);
                handle_item(result, e, &tag, true, &mut open)?;
                element_path.push(tag);
            }
            Event::Text(ref t) => {
                let text = t.unescape().context("invalid text node")?.trim().to_string();
                let current = element_path.last().map(String::as_str);
                match (current, open.as_mut()) {
                    _ if text.is_empty() => {}
                    (Some("Version"), Some(reference)) => reference.version = Some(text),
                    (Some("PrivateAssets"), Some(reference)) => {
                        reference.private_assets |= text.eq_ignore_ascii_case("all");
                    }
                    (Some("PackageId"), None) => identity.package_id = Some(text),
                    (Some("AssemblyName"), None) => identity.assembly_name = Some(text),
                    (Some("Version"), None) if in_property_group(&element_path) => identity.version = Some(text),
                    _ => {}
                }
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if tag == "PackageReference" {
                    if let Some(reference) = open.take() {
                        push_reference(result, reference);
                    }
                }
                element_path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(reference) = open.take() {
        push_reference(result, reference);
    }

    result.project_name = identity.package_id.or(identity.assembly_name);
    result.project_version = identity.version;
    Ok(())
}

fn in_property_group(path: &[String]) -> bool {
    path.len() >= 2 && path[path.len() - 2] == "PropertyGroup"
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

/// Read the attributes of an item element. `is_start` means the element has a body
/// that may still carry `<Version>`/`<PrivateAssets>` children.
fn handle_item(
    result: &mut ParseResult,
    e: &BytesStart<'_>,
    tag: &str,
    is_start: bool,
    open: &mut Option<OpenReference>,
) -> Result<()> {
    match tag {
        "PackageReference" => {
            let mut name = None;
            let mut version = None;
            let mut private_assets = false;
            for attr in e.attributes().flatten() {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let val = attr.unescape_value().context("invalid attribute value")?.into_owned();
                match key.as_str() {
                    // `Update` items adjust references declared elsewhere; they still name a package.
                    "Include" | "Update" if name.is_none() => name = Some(val),
                    "Version" | "VersionOverride" => version = Some(val),
                    "PrivateAssets" => private_assets = val.eq_ignore_ascii_case("all"),
                    _ => {}
                }
            }
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                debug!("PackageReference without Include skipped");
                return Ok(());
            };

            let reference = OpenReference {
                name,
                version,
                private_assets,
            };
            if is_start {
                *open = Some(reference);
            } else {
                push_reference(result, reference);
            }
        }
        "ProjectReference" => {
            if let Some(path) = attribute(e, "Include")? {
                result.push_package(
                    Package::new(path, LOCAL_VERSION, DependencyType::BuildDependencies)
                        .with_source(SOURCE_PROJECT_REFERENCE),
                );
            }
        }
        // packages.config
        "package" => {
            if let Some(id) = attribute(e, "id")? {
                let version = attribute(e, "version")?.unwrap_or_else(|| ANY_VERSION.to_string());
                let dev = attribute(e, "developmentDependency")?.is_some_and(|v| v.eq_ignore_ascii_case("true"));
                let dep_type = if dev {
                    DependencyType::DevDependencies
                } else {
                    DependencyType::Dependencies
                };
                result.push_package(Package::new(id, version, dep_type));
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, wanted: &str) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == wanted.as_bytes() {
            let val = attr.unescape_value().context("invalid attribute value")?.into_owned();
            return Ok(Some(val).filter(|v| !v.is_empty()));
        }
    }
    Ok(None)
}

fn push_reference(result: &mut ParseResult, reference: OpenReference) {
    let dep_type = if reference.private_assets {
        DependencyType::DevDependencies
    } else {
        DependencyType::Dependencies
    };
    let version = reference.version.unwrap_or_else(|| ANY_VERSION.to_string());
    result.push_package(Package::new(reference.name, version, dep_type));
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <AssemblyName>Weather.Api</AssemblyName>
    <Version>2.1.0</Version>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="12.0.3" />
    <PackageReference Include="Serilog">
      <Version>[3.1.1]</Version>
    </PackageReference>
    <PackageReference Include="StyleCop.Analyzers" Version="1.1.118" PrivateAssets="All" />
    <PackageReference Include="coverlet.collector" Version="6.0.0">
      <PrivateAssets>all</PrivateAssets>
    </PackageReference>
  </ItemGroup>
  <ItemGroup>
    <ProjectReference Include="..\Weather.Domain\Weather.Domain.csproj" />
  </ItemGroup>
</Project>"#;

    #[test]
    fn test_parse_csproj() {
        let result = CsprojParser::new().parse(CSPROJ);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.project_name.as_deref(), Some("Weather.Api"));
        assert_eq!(result.project_version.as_deref(), Some("2.1.0"));

        assert_eq!(result.packages.len(), 5);
        assert_eq!(result.packages[0].name, "Newtonsoft.Json");
        assert_eq!(result.packages[0].version, "12.0.3");
        assert_eq!(result.packages[1].name, "Serilog");
        assert_eq!(result.packages[1].version, "[3.1.1]");
        assert_eq!(result.count_of(DependencyType::DevDependencies), 2);
        assert_eq!(result.count_of(DependencyType::Dependencies), 2);

        let reference = result.packages.iter().find(|p| p.name.ends_with(".csproj")).unwrap();
        assert_eq!(reference.version, "local");
        assert_eq!(reference.dep_type, DependencyType::BuildDependencies);
        assert!(reference.is_local());
    }

    #[test]
    fn test_parse_packages_config() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="13.0.1" targetFramework="net452" />
  <package id="NUnit" version="3.13.3" targetFramework="net452" developmentDependency="true" />
</packages>"#;
        let parser = CsprojParser::new();
        assert!(parser.can_parse(xml));
        let result = parser.parse(xml);
        assert_eq!(result.packages.len(), 2);
        assert_eq!(result.packages[1].dep_type, DependencyType::DevDependencies);
    }

    #[test]
    fn test_malformed_xml_keeps_packages() {
        let xml = r#"<Project>
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Wrong>"#;
        let result = CsprojParser::new().parse(xml);
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error parsing csproj"));
    }

    #[test]
    fn test_detection() {
        let parser = CsprojParser::new();
        assert!(parser.can_parse(CSPROJ));
        assert!(!parser.can_parse("{\"dependencies\": {}}"));
        assert!(!parser.can_parse("<html><body></body></html>"));
    }
}
