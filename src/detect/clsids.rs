//! Known root-storage CLSIDs.
//!
//! Each record maps the class identifier an application writes into the
//! root directory entry of its compound file to the extension and MIME type
//! reported for it. Order matters only as a tie-break: the first matching
//! record wins. Adding a format is a data-only change.

use serde::Serialize;

/// One known application class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClsidRecord {
    /// Human-friendly label
    pub name: &'static str,
    /// Canonical GUID text, `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
    pub clsid: &'static str,
    /// Reported extension, lowercase without the dot
    pub extension: &'static str,
    /// Reported MIME type
    pub mime: &'static str,
}

/// All known CLSIDs, oldest format version first within each application
pub const CFBF_CLSIDS: &[ClsidRecord] = &[
    // === Word ===
    ClsidRecord {
        name: "Microsoft Word 6-95 Document",
        clsid: "00020900-0000-0000-C000-000000000046",
        extension: "doc",
        mime: "application/msword",
    },
    ClsidRecord {
        name: "Microsoft Word 97-2003 Document (Word.Document.8)",
        clsid: "00020906-0000-0000-C000-000000000046",
        extension: "doc",
        mime: "application/msword",
    },

    // === Excel ===
    ClsidRecord {
        name: "Microsoft Excel 5-95 Worksheet",
        clsid: "00020810-0000-0000-C000-000000000046",
        extension: "xls",
        mime: "application/vnd.ms-excel",
    },
    ClsidRecord {
        name: "Microsoft Excel 97-2003 Worksheet (Excel.Sheet.8)",
        clsid: "00020820-0000-0000-C000-000000000046",
        extension: "xls",
        mime: "application/vnd.ms-excel",
    },

    // === PowerPoint ===
    ClsidRecord {
        name: "Microsoft PowerPoint 4.0 Presentation",
        clsid: "EA7BAE70-FB3B-11CD-A903-00AA00510EA3",
        extension: "ppt",
        mime: "application/vnd.ms-powerpoint",
    },
    ClsidRecord {
        name: "Microsoft PowerPoint 97-2003 Presentation (PowerPoint.Show.8)",
        clsid: "64818D10-4F9B-11CF-86EA-00AA00B929E8",
        extension: "ppt",
        mime: "application/vnd.ms-powerpoint",
    },

    // === Visio ===
    ClsidRecord {
        name: "Microsoft Visio 2000-2002 Drawing",
        clsid: "00021A13-0000-0000-C000-000000000046",
        extension: "vsd",
        mime: "application/vnd.visio",
    },
    ClsidRecord {
        name: "Microsoft Visio 2003-2010 Drawing",
        clsid: "00021A14-0000-0000-C000-000000000046",
        extension: "vsd",
        mime: "application/vnd.visio",
    },

    // === Publisher ===
    ClsidRecord {
        name: "Microsoft Publisher 3.0/95-4.0/97",
        clsid: "0002123D-0000-0000-C000-000000000046",
        extension: "pub",
        mime: "application/x-mspublisher",
    },
    // The fourth group really is 00C0, not C000
    ClsidRecord {
        name: "Microsoft Publisher 5.0/98",
        clsid: "00021201-0000-0000-00C0-000000000046",
        extension: "pub",
        mime: "application/x-mspublisher",
    },

    // === Installer ===
    ClsidRecord {
        name: "Windows Installer Package",
        clsid: "000C1084-0000-0000-C000-000000000046",
        extension: "msi",
        mime: "application/x-msi",
    },
];

/// Records reporting `extension` (case-insensitive), in table order
pub fn find_by_extension<'a>(
    records: &'a [ClsidRecord],
    extension: &'a str,
) -> impl Iterator<Item = &'a ClsidRecord> + 'a {
    let wanted = extension.trim_start_matches('.');
    records
        .iter()
        .filter(move |r| r.extension.eq_ignore_ascii_case(wanted))
}
