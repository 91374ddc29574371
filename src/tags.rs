pub(crate) const LHEF_TAG_OPEN: &str = "<LesHouchesEvents";
pub(crate) const LHEF_LAST_LINE: &str = "</LesHouchesEvents>";
pub(crate) const XML_PROLOG_START: &str = "<?xml";
pub(crate) const COMMENT_START: &str = "<!--";
pub(crate) const COMMENT_END: &str = "-->";
pub(crate) const HEADER_START: &str = "<header";
pub(crate) const HEADER_END: &str = "</header>";
pub(crate) const INIT_START: &str = "<init";
pub(crate) const INIT_END: &str = "</init>";
pub(crate) const EVENT_START: &str = "<event";
pub(crate) const EVENT_END: &str = "</event>";

pub(crate) const REWEIGHT_TAG: &str = "rwgt";
pub(crate) const WEIGHT_TAG: &str = "wgt";
pub(crate) const WEIGHT_ID_ATTR: &str = "id";

// markers for generator bookkeeping lines mixed in with the particles
pub(crate) const PDF_MARKER: &str = "pdf";
pub(crate) const AMCATNLO_MARKER: &str = "#aMCatNLO";
