//! Event products read before any rendering starts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use shake_common::{EventInfo, Imt, MapError, MapResult, RasterField, Rupture, StationList};
use tracing::{debug, info};

pub const INFO_FILE: &str = "info.json";
pub const STATIONLIST_FILE: &str = "stationlist.json";
pub const RUPTURE_FILE: &str = "rupture.json";

/// File name of the mean grid of a measure, e.g. `PSA0p3_mean.json`.
pub fn grid_file_name(imt: &Imt) -> String {
    format!("{}_mean.json", imt.file_tag())
}

fn open(path: &Path) -> MapResult<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(MapError::DataNotAvailable(format!(
            "missing result file {}",
            path.display()
        ))),
        Err(e) => Err(MapError::Io(e)),
    }
}

/// Everything a mapping session reads from disk.
#[derive(Debug, Clone)]
pub struct EventInputs {
    pub products_dir: PathBuf,
    pub info: EventInfo,
    pub stations: StationList,
    pub rupture: Rupture,
    grids: BTreeMap<String, RasterField>,
    topography: Option<RasterField>,
}

impl EventInputs {
    /// Read event metadata, stations, rupture and the mean grid of MMI plus
    /// every listed measure. Missing files are reported as unavailable data.
    pub fn load(
        products_dir: &Path,
        imts: &[Imt],
        topography: Option<&Path>,
    ) -> MapResult<Self> {
        if !products_dir.is_dir() {
            return Err(MapError::DataNotAvailable(format!(
                "event products directory {} does not exist",
                products_dir.display()
            )));
        }

        let info = EventInfo::from_json_reader(open(&products_dir.join(INFO_FILE))?)?;
        let stations = StationList::from_json_reader(open(&products_dir.join(STATIONLIST_FILE))?)?;
        let rupture = Rupture::from_json_reader(open(&products_dir.join(RUPTURE_FILE))?)?;

        let mut grids = BTreeMap::new();
        for imt in std::iter::once(&Imt::Mmi).chain(imts) {
            let tag = imt.file_tag();
            if grids.contains_key(&tag) {
                continue;
            }
            let path = products_dir.join(grid_file_name(imt));
            let grid = RasterField::from_json_reader(open(&path)?)?;
            debug!(imt = %imt, nx = grid.width(), ny = grid.height(), "Loaded mean grid");
            grids.insert(tag, grid);
        }

        let topography = match topography {
            Some(path) => {
                let grid = RasterField::from_json_reader(open(path)?)?;
                debug!(nx = grid.width(), ny = grid.height(), "Loaded topography");
                Some(grid)
            }
            None => None,
        };

        info!(
            event_id = %info.event_id,
            stations = stations.len(),
            grids = grids.len(),
            "Loaded event products"
        );

        Ok(Self {
            products_dir: products_dir.to_path_buf(),
            info,
            stations,
            rupture,
            grids,
            topography,
        })
    }

    /// Mean grid of a measure in stored units.
    pub fn grid(&self, imt: &Imt) -> MapResult<&RasterField> {
        self.grids.get(&imt.file_tag()).ok_or_else(|| {
            MapError::DataNotAvailable(format!("no {} grid was loaded", imt))
        })
    }

    pub fn topography(&self) -> Option<&RasterField> {
        self.topography.as_ref()
    }
}
