//! Offline lookup tables consulted by the rule engine.
//!
//! Entries are matched by package name per ecosystem; see [`names_match`] for the
//! normalization each ecosystem uses. TypeScript shares the JavaScript tables.

use crate::analyzer::python::normalize_name;
use crate::models::{Ecosystem, Severity};

use Severity::{Critical, High, Moderate};

pub struct Deprecation {
    pub name: &'static str,
    pub replacement: &'static str,
}

/// One affected range of one advisory. A package may appear several times when an
/// advisory covers disjoint ranges or several advisories apply.
pub struct Advisory {
    pub name: &'static str,
    /// First affected version; `None` means every earlier release is affected.
    pub introduced: Option<&'static str>,
    /// First fixed version; `None` means no release is fixed.
    pub fixed: Option<&'static str>,
    pub severity: Severity,
    pub id: &'static str,
    pub summary: &'static str,
}

pub struct Alternative {
    pub name: &'static str,
    pub suggestion: &'static str,
}

pub struct BundleWeight {
    pub name: &'static str,
    /// Approximate minified size in kilobytes.
    pub size_kb: u32,
    pub suggestion: &'static str,
}

const fn dep(name: &'static str, replacement: &'static str) -> Deprecation {
    Deprecation { name, replacement }
}

const fn adv(
    name: &'static str,
    introduced: Option<&'static str>,
    fixed: Option<&'static str>,
    severity: Severity,
    id: &'static str,
    summary: &'static str,
) -> Advisory {
    Advisory {
        name,
        introduced,
        fixed,
        severity,
        id,
        summary,
    }
}

const fn alt(name: &'static str, suggestion: &'static str) -> Alternative {
    Alternative { name, suggestion }
}

static JS_DEPRECATED: &[Deprecation] = &[
    dep("request", "axios or the native fetch API"),
    dep("moment", "date-fns or dayjs"),
    dep("node-sass", "sass (Dart Sass)"),
    dep("tslint", "eslint with typescript-eslint"),
    dep("left-pad", "String.prototype.padStart"),
    dep("querystring", "URLSearchParams"),
    dep("babel-eslint", "@babel/eslint-parser"),
    dep("istanbul", "nyc or c8"),
];

static PYTHON_DEPRECATED: &[Deprecation] = &[
    dep("pycrypto", "cryptography or pycryptodome"),
    dep("nose", "pytest"),
    dep("distribute", "setuptools"),
    dep("sklearn", "scikit-learn"),
    dep("mock", "unittest.mock from the standard library"),
];

static RUST_DEPRECATED: &[Deprecation] = &[
    dep("failure", "thiserror or anyhow"),
    dep("error-chain", "thiserror or anyhow"),
    dep("lazy_static", "std::sync::LazyLock or once_cell"),
    dep("tempdir", "tempfile"),
    dep("rustc-serialize", "serde"),
    dep("structopt", "clap with the derive feature"),
    dep("dotenv", "dotenvy"),
];

static GO_DEPRECATED: &[Deprecation] = &[
    dep("github.com/dgrijalva/jwt-go", "github.com/golang-jwt/jwt/v5"),
    dep("github.com/golang/protobuf", "google.golang.org/protobuf"),
    dep("github.com/pkg/errors", "the standard errors package with fmt.Errorf wrapping"),
    dep("github.com/satori/go.uuid", "github.com/google/uuid"),
    dep("github.com/golang/mock", "go.uber.org/mock"),
];

static RUBY_DEPRECATED: &[Deprecation] = &[
    dep("coffee-rails", "plain JavaScript or TypeScript"),
    dep("therubyracer", "mini_racer or Node.js"),
    dep("sass-rails", "dartsass-rails or cssbundling-rails"),
    dep("uglifier", "terser via jsbundling-rails"),
    dep("paperclip", "Active Storage"),
];

static DOTNET_DEPRECATED: &[Deprecation] = &[
    dep("EntityFramework", "Microsoft.EntityFrameworkCore"),
    dep("Microsoft.AspNet.Mvc", "ASP.NET Core MVC"),
    dep("Microsoft.AspNet.WebApi*", "ASP.NET Core Web API"),
    dep("Microsoft.Owin*", "ASP.NET Core middleware"),
    dep("Microsoft.AspNet.SignalR", "Microsoft.AspNetCore.SignalR"),
    dep("System.Data.SqlClient", "Microsoft.Data.SqlClient"),
    dep("WindowsAzure.Storage", "Azure.Storage.Blobs"),
    dep("Microsoft.Azure.DocumentDB", "Microsoft.Azure.Cosmos"),
];

static CPP_DEPRECATED: &[Deprecation] = &[
    dep("openssl-windows", "openssl"),
    dep("openssl-unix", "openssl"),
    dep("boost-signals", "boost-signals2"),
    dep("cpprestsdk", "a maintained HTTP client such as cpr or Boost.Beast"),
];

static LUA_DEPRECATED: &[Deprecation] = &[dep("luacrypto", "luaossl")];

static JS_ADVISORIES: &[Advisory] = &[
    adv("lodash", None, Some("4.17.21"), High, "CVE-2021-23337", "command injection in template"),
    adv("axios", None, Some("0.21.2"), High, "CVE-2021-3749", "regular expression denial of service"),
    adv("axios", None, Some("1.6.0"), Moderate, "CVE-2023-45857", "XSRF-TOKEN leaked to third-party hosts"),
    adv("minimist", None, Some("1.2.6"), Critical, "CVE-2021-44906", "prototype pollution"),
    adv("node-fetch", None, Some("2.6.7"), High, "CVE-2022-0235", "cookie exposure on cross-host redirect"),
    adv("jsonwebtoken", None, Some("9.0.0"), High, "CVE-2022-23529", "insecure key handling"),
    adv("express", None, Some("4.19.2"), Moderate, "CVE-2024-29041", "open redirect"),
    adv("jquery", None, Some("3.5.0"), Moderate, "CVE-2020-11022", "cross-site scripting in htmlPrefilter"),
    adv("moment", None, Some("2.29.4"), High, "CVE-2022-31129", "inefficient RFC 2822 parsing (ReDoS)"),
    adv("semver", Some("7.0.0"), Some("7.5.2"), Moderate, "CVE-2022-25883", "regular expression denial of service"),
    adv("ws", Some("8.0.0"), Some("8.17.1"), High, "CVE-2024-37890", "denial of service via many headers"),
    adv("follow-redirects", None, Some("1.15.6"), Moderate, "CVE-2024-28849", "proxy credentials leaked on redirect"),
];

static PYTHON_ADVISORIES: &[Advisory] = &[
    adv("django", None, Some("3.2"), High, "EOL", "release line no longer receives security fixes"),
    adv("django", Some("4.0"), Some("4.2"), High, "EOL", "release line no longer receives security fixes"),
    adv("urllib3", None, Some("1.26.18"), Moderate, "CVE-2023-45803", "request body kept on 303 redirect"),
    adv("urllib3", Some("2.0.0"), Some("2.0.7"), Moderate, "CVE-2023-45803", "request body kept on 303 redirect"),
    adv("pillow", None, Some("10.0.1"), High, "CVE-2023-4863", "heap buffer overflow in bundled libwebp"),
    adv("requests", None, Some("2.31.0"), Moderate, "CVE-2023-32681", "Proxy-Authorization header leak"),
    adv("pyyaml", None, Some("5.4"), Critical, "CVE-2020-14343", "arbitrary code execution in full_load"),
    adv("jinja2", None, Some("3.1.3"), Moderate, "CVE-2024-22195", "cross-site scripting in xmlattr filter"),
    adv("flask", None, Some("2.2.5"), High, "CVE-2023-30861", "session cookie cached by proxies"),
];

static RUST_ADVISORIES: &[Advisory] = &[
    adv("regex", None, Some("1.5.5"), High, "CVE-2022-24713", "denial of service on untrusted patterns"),
    adv("chrono", None, Some("0.4.20"), Moderate, "RUSTSEC-2020-0159", "potential segfault in localtime_r"),
    adv("time", None, Some("0.2.23"), Moderate, "RUSTSEC-2020-0071", "potential segfault reading the environment"),
    adv("hyper", None, Some("0.14.10"), High, "RUSTSEC-2021-0078", "lenient header parsing enables request smuggling"),
    adv("smallvec", None, Some("1.6.1"), High, "RUSTSEC-2021-0003", "buffer overflow in insert_many"),
];

static GO_ADVISORIES: &[Advisory] = &[
    adv("golang.org/x/crypto", None, Some("0.17.0"), High, "CVE-2023-48795", "SSH Terrapin prefix truncation"),
    adv("golang.org/x/net", None, Some("0.17.0"), High, "CVE-2023-44487", "HTTP/2 rapid reset"),
    adv("golang.org/x/text", None, Some("0.3.8"), High, "CVE-2022-32149", "denial of service in language tag parsing"),
    adv("google.golang.org/grpc", None, Some("1.56.3"), High, "CVE-2023-44487", "HTTP/2 rapid reset"),
    adv("github.com/gin-gonic/gin", None, Some("1.9.1"), Moderate, "CVE-2023-29401", "filename injection in FileAttachment"),
    adv("gopkg.in/yaml.v2", None, Some("2.2.8"), Moderate, "CVE-2019-11254", "denial of service on malformed input"),
    adv("github.com/dgrijalva/jwt-go", None, None, High, "CVE-2020-26160", "audience check bypass"),
];

static DOTNET_ADVISORIES: &[Advisory] = &[
    adv("Newtonsoft.Json", None, Some("13.0.1"), High, "GHSA-5crp-9r3c-p9vr", "stack overflow on deeply nested input"),
    adv("System.Text.Json", None, Some("8.0.5"), High, "CVE-2024-43485", "denial of service with extension data"),
    adv("Microsoft.AspNetCore.*", None, Some("6.0.0"), High, "EOL", "ASP.NET Core release line out of support"),
    adv("System.Data.SqlClient", None, Some("4.8.6"), High, "CVE-2024-0056", "security feature bypass"),
];

static RUBY_ADVISORIES: &[Advisory] = &[
    adv("rails", None, Some("6.1.0"), High, "EOL", "release line no longer receives security fixes"),
    adv("nokogiri", None, Some("1.13.4"), High, "CVE-2022-24836", "regular expression denial of service"),
    adv("rack", None, Some("2.2.8.1"), Moderate, "CVE-2024-26146", "header parsing denial of service"),
    adv("puma", None, Some("6.4.2"), High, "CVE-2024-21647", "HTTP request smuggling"),
];

static CPP_ADVISORIES: &[Advisory] = &[
    adv("openssl", Some("3.0.0"), Some("3.0.7"), High, "CVE-2022-3602", "X.509 email address buffer overflow"),
    adv("zlib", None, Some("1.2.12"), High, "CVE-2018-25032", "memory corruption when compressing"),
    adv("curl", Some("7.69.0"), Some("8.4.0"), High, "CVE-2023-38545", "SOCKS5 heap buffer overflow"),
    adv("expat", None, Some("2.4.3"), Critical, "CVE-2022-22822", "integer overflow in addBinding"),
    adv("libwebp", None, Some("1.3.2"), High, "CVE-2023-4863", "heap buffer overflow"),
];

static LUA_ADVISORIES: &[Advisory] = &[adv(
    "lua",
    Some("5.4.0"),
    Some("5.4.4"),
    High,
    "CVE-2022-28805",
    "heap buffer over-read in the parser",
)];

static JS_ALTERNATIVES: &[Alternative] = &[
    alt("moment", "dayjs or date-fns (tree-shakeable, immutable)"),
    alt("lodash", "lodash-es or native array/object methods"),
    alt("underscore", "native array/object methods"),
    alt("node-fetch", "the native fetch API (Node.js 18+)"),
    alt("bluebird", "native Promise"),
    alt("q", "native Promise with async/await"),
    alt("jquery", "native DOM APIs"),
    alt("classnames", "clsx (smaller, faster)"),
    alt("rimraf", "fs.rm with { recursive: true }"),
    alt("mkdirp", "fs.mkdir with { recursive: true }"),
];

static PYTHON_ALTERNATIVES: &[Alternative] = &[
    alt("simplejson", "the standard json module"),
    alt("six", "native Python 3 syntax"),
    alt("futures", "concurrent.futures from the standard library"),
    alt("enum34", "the standard enum module"),
];

static RUST_ALTERNATIVES: &[Alternative] = &[alt("once_cell", "std::sync::LazyLock and OnceLock")];

static GO_ALTERNATIVES: &[Alternative] = &[alt("github.com/sirupsen/logrus", "log/slog from the standard library")];

static DOTNET_ALTERNATIVES: &[Alternative] = &[alt("Newtonsoft.Json", "System.Text.Json")];

static JS_BUNDLE_WEIGHTS: &[BundleWeight] = &[
    BundleWeight { name: "moment", size_kb: 290, suggestion: "dayjs (2 KB)" },
    BundleWeight { name: "lodash", size_kb: 72, suggestion: "per-method imports or lodash-es" },
    BundleWeight { name: "jquery", size_kb: 87, suggestion: "native DOM APIs" },
    BundleWeight { name: "core-js", size_kb: 240, suggestion: "targeted polyfills for your browser matrix" },
    BundleWeight { name: "aws-sdk", size_kb: 2400, suggestion: "modular @aws-sdk/client-* packages" },
    BundleWeight { name: "three", size_kb: 600, suggestion: "importing only the modules you use" },
    BundleWeight { name: "chart.js", size_kb: 200, suggestion: "registering only the chart types you use" },
];

/// Documentation links listed in the report's References section.
static JS_REFERENCES: &[(&str, &str)] = &[
    ("npm audit", "https://docs.npmjs.com/cli/commands/npm-audit"),
    ("GitHub Advisory Database", "https://github.com/advisories?query=ecosystem%3Anpm"),
    ("Bundlephobia", "https://bundlephobia.com"),
];
static PYTHON_REFERENCES: &[(&str, &str)] = &[
    ("pip-audit", "https://pypi.org/project/pip-audit/"),
    ("Python Packaging Advisory Database", "https://github.com/pypa/advisory-database"),
];
static RUST_REFERENCES: &[(&str, &str)] = &[
    ("cargo-audit", "https://crates.io/crates/cargo-audit"),
    ("RustSec Advisory Database", "https://rustsec.org/advisories/"),
];
static GO_REFERENCES: &[(&str, &str)] = &[
    ("govulncheck", "https://pkg.go.dev/golang.org/x/vuln/cmd/govulncheck"),
    ("Go Vulnerability Database", "https://pkg.go.dev/vuln/"),
];
static RUBY_REFERENCES: &[(&str, &str)] = &[
    ("bundler-audit", "https://github.com/rubysec/bundler-audit"),
    ("Ruby Advisory Database", "https://github.com/rubysec/ruby-advisory-db"),
];
static DOTNET_REFERENCES: &[(&str, &str)] = &[
    ("dotnet list package --vulnerable", "https://learn.microsoft.com/dotnet/core/tools/dotnet-list-package"),
    ("GitHub Advisory Database", "https://github.com/advisories?query=ecosystem%3Anuget"),
];
static CPP_REFERENCES: &[(&str, &str)] = &[
    ("vcpkg versioning", "https://learn.microsoft.com/vcpkg/users/versioning"),
    ("NVD", "https://nvd.nist.gov/vuln/search"),
];
static LUA_REFERENCES: &[(&str, &str)] = &[
    ("LuaRocks", "https://luarocks.org"),
    ("NVD", "https://nvd.nist.gov/vuln/search"),
];

pub fn deprecations(ecosystem: Ecosystem) -> &'static [Deprecation] {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => JS_DEPRECATED,
        Ecosystem::Python => PYTHON_DEPRECATED,
        Ecosystem::Rust => RUST_DEPRECATED,
        Ecosystem::Go => GO_DEPRECATED,
        Ecosystem::Ruby => RUBY_DEPRECATED,
        Ecosystem::DotNet => DOTNET_DEPRECATED,
        Ecosystem::Cpp => CPP_DEPRECATED,
        Ecosystem::Lua => LUA_DEPRECATED,
    }
}

pub fn advisories(ecosystem: Ecosystem) -> &'static [Advisory] {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => JS_ADVISORIES,
        Ecosystem::Python => PYTHON_ADVISORIES,
        Ecosystem::Rust => RUST_ADVISORIES,
        Ecosystem::Go => GO_ADVISORIES,
        Ecosystem::Ruby => RUBY_ADVISORIES,
        Ecosystem::DotNet => DOTNET_ADVISORIES,
        Ecosystem::Cpp => CPP_ADVISORIES,
        Ecosystem::Lua => LUA_ADVISORIES,
    }
}

pub fn alternatives(ecosystem: Ecosystem) -> &'static [Alternative] {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => JS_ALTERNATIVES,
        Ecosystem::Python => PYTHON_ALTERNATIVES,
        Ecosystem::Rust => RUST_ALTERNATIVES,
        Ecosystem::Go => GO_ALTERNATIVES,
        Ecosystem::DotNet => DOTNET_ALTERNATIVES,
        Ecosystem::Ruby | Ecosystem::Cpp | Ecosystem::Lua => &[],
    }
}

pub fn bundle_weights(ecosystem: Ecosystem) -> &'static [BundleWeight] {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => JS_BUNDLE_WEIGHTS,
        _ => &[],
    }
}

pub fn references(ecosystem: Ecosystem) -> &'static [(&'static str, &'static str)] {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => JS_REFERENCES,
        Ecosystem::Python => PYTHON_REFERENCES,
        Ecosystem::Rust => RUST_REFERENCES,
        Ecosystem::Go => GO_REFERENCES,
        Ecosystem::Ruby => RUBY_REFERENCES,
        Ecosystem::DotNet => DOTNET_REFERENCES,
        Ecosystem::Cpp => CPP_REFERENCES,
        Ecosystem::Lua => LUA_REFERENCES,
    }
}

/// The ecosystem's own audit tool, suggested in the recommendations.
pub fn audit_command(ecosystem: Ecosystem) -> &'static str {
    match ecosystem {
        Ecosystem::JavaScript | Ecosystem::TypeScript => "npm audit",
        Ecosystem::Python => "pip-audit",
        Ecosystem::Rust => "cargo audit",
        Ecosystem::Go => "govulncheck ./...",
        Ecosystem::Ruby => "bundle audit",
        Ecosystem::DotNet => "dotnet list package --vulnerable",
        Ecosystem::Cpp => "vcpkg x-update-baseline",
        Ecosystem::Lua => "luarocks list --outdated",
    }
}

/// Compare a table entry against a package name. A trailing `*` in the entry
/// makes it a prefix match.
pub fn names_match(ecosystem: Ecosystem, entry: &str, name: &str) -> bool {
    if let Some(prefix) = entry.strip_suffix('*') {
        return name.len() >= prefix.len()
            && name.is_char_boundary(prefix.len())
            && name[..prefix.len()].eq_ignore_ascii_case(prefix);
    }

    match ecosystem {
        Ecosystem::Python => normalize_name(entry) == normalize_name(name),
        Ecosystem::Rust => entry.replace('_', "-") == name.replace('_', "-"),
        Ecosystem::Go => entry == name,
        _ => entry.eq_ignore_ascii_case(name),
    }
}
