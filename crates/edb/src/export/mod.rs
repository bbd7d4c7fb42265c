//! Exporters over the normalized record: loose EML/ICS/VCF files and
//! Unicode PST synthesis.

pub mod eml;
pub mod ics;
pub mod pst;
pub mod vcf;
