//! Workbook to CSV conversion.
//!
//! [`Converter`] reads the workbook-wide parts of a package once (manifest,
//! number formats, shared strings) and then renders selected sheets on demand.

use crate::container::{OoxmlContainer, PackageReader};
use crate::detect::{detect_package_kind, ensure_zip, PackageKind};
use crate::error::{Error, Result, SheetSelector};
use crate::render::{ConvertOptions, CsvRenderer, SheetSelection};
use crate::xlsx::{
    NumberFormatCatalog, SharedStrings, SheetDescriptor, SheetParser, Workbook,
    SHARED_STRINGS_PART,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default location of the styles part.
const STYLES_PART: &str = "xl/styles.xml";

/// Converts the sheets of one workbook package.
pub struct Converter<P: PackageReader = OoxmlContainer> {
    package: P,
    kind: PackageKind,
    workbook: Workbook,
    catalog: NumberFormatCatalog,
    shared_strings: SharedStrings,
}

impl Converter<OoxmlContainer> {
    /// Open a workbook file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Open a workbook from its bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        ensure_zip(&data)?;
        Self::new(OoxmlContainer::from_bytes(data)?)
    }
}

impl<P: PackageReader> Converter<P> {
    /// Read the workbook-wide parts of `package`.
    pub fn new(package: P) -> Result<Self> {
        let kind = detect_package_kind(&package)?;
        let workbook = Workbook::from_package(&package)?;
        let rels = package.read_relationships(&workbook.part)?;

        let part_for = |suffix: &str, fallback: &str| -> String {
            rels.by_id
                .values()
                .find(|rel| rel.rel_type.ends_with(suffix) && !rel.external)
                .map(|rel| crate::container::resolve_path(&workbook.part, &rel.target))
                .unwrap_or_else(|| fallback.to_string())
        };

        let styles_part = part_for("/styles", STYLES_PART);
        let catalog = if package.part_exists(&styles_part) {
            match package
                .read_xml(&styles_part)
                .and_then(|xml| NumberFormatCatalog::parse(&xml))
            {
                Ok(catalog) => catalog,
                Err(e) => {
                    log::warn!("{}: {}; all cells use the General format", styles_part, e);
                    NumberFormatCatalog::default()
                }
            }
        } else {
            NumberFormatCatalog::default()
        };

        let strings_part = part_for("/sharedStrings", SHARED_STRINGS_PART);
        let shared_strings = if package.part_exists(&strings_part) {
            let xml = package.read_xml(&strings_part)?;
            SharedStrings::parse(&xml)
                .map_err(|e| Error::corrupt(&strings_part, e.to_string()))?
                .with_part(strings_part.as_str())
        } else {
            SharedStrings::default().with_part(strings_part.as_str())
        };

        log::debug!(
            "{:?} package: {} sheets, {} shared strings, {} cell formats, date1904={}",
            kind,
            workbook.sheets.len(),
            shared_strings.len(),
            catalog.len(),
            workbook.date1904
        );

        Ok(Self {
            package,
            kind,
            workbook,
            catalog,
            shared_strings,
        })
    }

    /// The parsed manifest.
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Kind of spreadsheet package.
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// Sheets the options ask for, in manifest order.
    ///
    /// Fails with [`Error::SheetNotFound`] when a requested sheet is not in
    /// the manifest or its part is missing from the package.
    pub fn select_sheets(&self, options: &ConvertOptions) -> Result<Vec<&SheetDescriptor>> {
        let selection = options.selection();
        let sheets = select_sheets(&self.workbook, &selection)?;

        for sheet in &sheets {
            if !self.package.part_exists(&sheet.target) {
                let selector = match &selection {
                    SheetSelection::Single(selector) => selector.clone(),
                    SheetSelection::All { .. } => SheetSelector::Name(sheet.name.clone()),
                };
                log::debug!("sheet '{}' points to missing part {}", sheet.name, sheet.target);
                return Err(Error::SheetNotFound(selector));
            }
        }
        Ok(sheets)
    }

    /// Convert the selected sheets into one string.
    ///
    /// Nothing is returned unless every sheet converts.
    pub fn convert(&self, options: &ConvertOptions) -> Result<String> {
        let mut out = Vec::new();
        self.convert_to_writer(&mut out, options)?;
        String::from_utf8(out).map_err(|e| Error::Csv(e.to_string()))
    }

    /// Stream the selected sheets to `out`, separated by the sheet separator.
    pub fn convert_to_writer<W: Write>(&self, out: &mut W, options: &ConvertOptions) -> Result<()> {
        options.validate()?;
        let renderer = CsvRenderer::new(options)?;
        let sheets = self.select_sheets(options)?;

        for (i, sheet) in sheets.iter().enumerate() {
            if i > 0 {
                renderer.write_separator(out)?;
            }
            self.write_sheet(sheet, &renderer, out, options)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Stream one sheet to `out`.
    pub fn convert_sheet_to_writer<W: Write>(
        &self,
        sheet: &SheetDescriptor,
        out: &mut W,
        options: &ConvertOptions,
    ) -> Result<()> {
        options.validate()?;
        let renderer = CsvRenderer::new(options)?;
        self.write_sheet(sheet, &renderer, out, options)?;
        out.flush()?;
        Ok(())
    }

    fn write_sheet<W: Write>(
        &self,
        sheet: &SheetDescriptor,
        renderer: &CsvRenderer,
        out: &mut W,
        options: &ConvertOptions,
    ) -> Result<()> {
        if !self.package.part_exists(&sheet.target) {
            return Err(Error::SheetNotFound(SheetSelector::Name(sheet.name.clone())));
        }
        let xml = self.package.read_xml(&sheet.target)?;
        let rels = if options.include_hyperlinks {
            self.package.read_relationships(&sheet.target)?
        } else {
            Default::default()
        };

        let parser = SheetParser::new(&self.catalog, &self.shared_strings, options)
            .with_date_system(self.workbook.date_system())
            .with_relationships(&rels)
            .with_part(&sheet.target);
        let written = renderer.write_rows(out, parser.parse(&xml)?)?;
        log::debug!("sheet '{}': {} lines", sheet.name, written);
        Ok(())
    }

    /// Destination file of every selected sheet under `dir`.
    ///
    /// All destinations are checked up front. Two sheets landing on the same
    /// file always fail with [`Error::OutputExists`]; an existing file fails
    /// the plan unless `overwrite` is set.
    pub fn plan_dir_output(
        &self,
        dir: &Path,
        options: &ConvertOptions,
        overwrite: bool,
    ) -> Result<Vec<(&SheetDescriptor, PathBuf)>> {
        options.validate()?;
        let mut seen = HashSet::new();
        let mut plan = Vec::new();
        for sheet in self.select_sheets(options)? {
            let file_name = output_file_name(&sheet.name);
            let path = dir.join(&file_name);
            // case-insensitive file systems fold `Q1.csv` and `q1.csv`
            if !seen.insert(file_name.to_lowercase()) {
                log::debug!("sheet '{}' collides with an earlier sheet", sheet.name);
                return Err(Error::OutputExists(path));
            }
            if !overwrite && path.exists() {
                return Err(Error::OutputExists(path));
            }
            plan.push((sheet, path));
        }
        Ok(plan)
    }

    /// Write each selected sheet to `<dir>/<sheet name>.csv`.
    pub fn convert_to_dir(
        &self,
        dir: impl AsRef<Path>,
        options: &ConvertOptions,
        overwrite: bool,
    ) -> Result<Vec<PathBuf>> {
        self.convert_to_dir_with(dir, options, overwrite, |_| {})
    }

    /// Like [`convert_to_dir`](Self::convert_to_dir), calling `on_sheet`
    /// before each sheet is written.
    pub fn convert_to_dir_with<F>(
        &self,
        dir: impl AsRef<Path>,
        options: &ConvertOptions,
        overwrite: bool,
        mut on_sheet: F,
    ) -> Result<Vec<PathBuf>>
    where
        F: FnMut(&SheetDescriptor),
    {
        let dir = dir.as_ref();
        let plan = self.plan_dir_output(dir, options, overwrite)?;
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(plan.len());
        for (sheet, path) in plan {
            on_sheet(sheet);
            self.write_sheet_file(sheet, &path, options)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write the selected sheets to a single file.
    pub fn convert_to_path(
        &self,
        path: impl AsRef<Path>,
        options: &ConvertOptions,
        overwrite: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        if !overwrite && path.exists() {
            return Err(Error::OutputExists(path.to_path_buf()));
        }
        options.validate()?;
        self.select_sheets(options)?;
        write_file(path, |out| self.convert_to_writer(out, options))
    }

    /// Write one sheet to `path`; a failed conversion leaves no file behind.
    pub fn write_sheet_file(
        &self,
        sheet: &SheetDescriptor,
        path: &Path,
        options: &ConvertOptions,
    ) -> Result<()> {
        write_file(path, |out| self.convert_sheet_to_writer(sheet, out, options))
    }
}

impl<P: PackageReader> std::fmt::Debug for Converter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("kind", &self.kind)
            .field("sheets", &self.workbook.sheet_names())
            .finish()
    }
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let result = write(&mut out).and_then(|_| out.flush().map_err(Error::from));
    if result.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial output {}: {}", path.display(), e);
        }
    }
    result
}

/// `<sheet name>.csv`, with path separators replaced.
pub fn output_file_name(sheet_name: &str) -> String {
    let name: String = sheet_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let name = match name.as_str() {
        "" | "." | ".." => "sheet".to_string(),
        _ => name,
    };
    format!("{}.csv", name)
}

/// Resolve a selection against the manifest.
///
/// Single selections fail with [`Error::SheetNotFound`]; pattern selections
/// keep manifest order, applying inclusion patterns before exclusion ones.
pub fn select_sheets<'w>(
    workbook: &'w Workbook,
    selection: &SheetSelection,
) -> Result<Vec<&'w SheetDescriptor>> {
    match selection {
        SheetSelection::Single(selector) => {
            let sheet = match selector {
                SheetSelector::Number(number) => workbook.sheet_by_number(*number),
                SheetSelector::Name(name) => workbook.sheet_by_name(name),
            };
            sheet
                .map(|sheet| vec![sheet])
                .ok_or_else(|| Error::SheetNotFound(selector.clone()))
        }
        SheetSelection::All {
            include,
            exclude,
            skip_hidden,
        } => {
            let include = build_globs(include)?;
            let exclude = build_globs(exclude)?;
            let sheets: Vec<_> = workbook
                .sheets
                .iter()
                .filter(|sheet| include.as_ref().is_none_or(|globs| globs.is_match(&sheet.name)))
                .filter(|sheet| !exclude.as_ref().is_some_and(|globs| globs.is_match(&sheet.name)))
                .filter(|sheet| !(*skip_hidden && sheet.hidden))
                .collect();
            log::debug!(
                "selected sheets: {:?}",
                sheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
            );
            Ok(sheets)
        }
    }
}

/// `None` when there are no patterns, so that "no inclusion patterns" keeps
/// every sheet.
fn build_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}
